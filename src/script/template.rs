// src/script/template.rs

//! `{placeholder}` substitution for task-file strings.
//!
//! - `{name}`: the name the task was invoked under
//! - `{0}`: the whole pattern match
//! - `{N}`: capture group N
//! - `{{` / `}}`: literal braces

use crate::errors::{LarkError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece<'a> {
    Text(&'a str),
    Brace(char),
    Name,
    Capture(usize),
}

fn parse(template: &str) -> Result<Vec<Piece<'_>>> {
    let mut pieces = Vec::new();
    let mut rest = template;

    while let Some(idx) = rest.find(['{', '}']) {
        if idx > 0 {
            pieces.push(Piece::Text(&rest[..idx]));
        }
        let tail = &rest[idx..];

        if tail.starts_with("{{") {
            pieces.push(Piece::Brace('{'));
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            pieces.push(Piece::Brace('}'));
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            return Err(LarkError::Argument(format!(
                "unmatched '}}' in {template:?}"
            )));
        } else {
            let end = tail.find('}').ok_or_else(|| {
                LarkError::Argument(format!("unclosed '{{' in {template:?}"))
            })?;
            let key = &tail[1..end];
            let piece = match key {
                "name" => Piece::Name,
                digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                    let n = digits.parse().map_err(|_| {
                        LarkError::Argument(format!("capture index too large in {template:?}"))
                    })?;
                    Piece::Capture(n)
                }
                other => {
                    return Err(LarkError::Argument(format!(
                        "unknown placeholder {{{other}}} in {template:?}"
                    )));
                }
            };
            pieces.push(piece);
            rest = &tail[end + 1..];
        }
    }

    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }
    Ok(pieces)
}

/// Check placeholder syntax without substituting.
pub fn check(template: &str) -> Result<()> {
    parse(template).map(|_| ())
}

/// Substitute placeholders. `captures[0]` is the whole match.
pub fn expand(template: &str, name: &str, captures: &[String]) -> Result<String> {
    let mut out = String::with_capacity(template.len());

    for piece in parse(template)? {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Brace(c) => out.push(c),
            Piece::Name => out.push_str(name),
            Piece::Capture(i) => {
                let value = captures.get(i).ok_or_else(|| {
                    LarkError::Argument(format!(
                        "capture {{{i}}} out of range for task {name:?} ({} available)",
                        captures.len()
                    ))
                })?;
                out.push_str(value);
            }
        }
    }

    Ok(out)
}
