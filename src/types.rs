use serde::Deserialize;

/// A field that may be written as a single string or as a list of strings
/// (e.g. `follows = "objects"` vs `follows = ["objects", "headers"]`).
///
/// Resolved once at the API boundary via [`OneOrMany::into_vec`]; the core
/// only ever sees the canonical list form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(s) => std::slice::from_ref(s),
            OneOrMany::Many(v) => v,
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl From<&str> for OneOrMany {
    fn from(s: &str) -> Self {
        OneOrMany::One(s.to_string())
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(v: Vec<String>) -> Self {
        OneOrMany::Many(v)
    }
}

/// How an execution group records failures of its scheduled work.
///
/// - `FirstWins`: keep only the first error; later ones are discarded
///   (and logged). This is the default.
/// - `Accumulate`: keep every error in arrival order. `wait` still reports
///   the first one; the rest are available through
///   [`ExecutionGroup::errors`](crate::group::ExecutionGroup::errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    #[serde(alias = "first")]
    FirstWins,
    #[serde(alias = "all")]
    Accumulate,
}

impl Default for ErrorMode {
    fn default() -> Self {
        ErrorMode::FirstWins
    }
}
