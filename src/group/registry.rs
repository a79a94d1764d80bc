// src/group/registry.rs

//! Process-wide table of named execution groups.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::errors::{LarkError, Result};
use crate::group::execution_group::{ExecutionGroup, GroupOptions};

#[derive(Debug, Default)]
struct Table {
    by_name: HashMap<String, ExecutionGroup>,
    /// Creation order, used for deterministic snapshots.
    order: Vec<ExecutionGroup>,
}

impl Table {
    fn get_or_insert(&mut self, name: &str, options: GroupOptions) -> ExecutionGroup {
        if let Some(group) = self.by_name.get(name) {
            return group.clone();
        }
        self.insert(ExecutionGroup::new(name, Vec::new(), options))
    }

    fn insert(&mut self, group: ExecutionGroup) -> ExecutionGroup {
        debug!(group = %group.name(), follows = ?group.follows(), "created execution group");
        self.by_name.insert(group.name().to_string(), group.clone());
        self.order.push(group.clone());
        group
    }
}

/// All lookups and creations are serialised by one mutex; group-local
/// state (counter, error slot) is synchronised by each group itself.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    table: Mutex<Table>,
    options: GroupOptions,
}

impl GroupRegistry {
    pub fn new(options: GroupOptions) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            options,
        }
    }

    /// Look up `name`, creating it with no follows if absent.
    ///
    /// This is the implicit creation path used by `exec`/`start`/`wait`; it
    /// never conflicts.
    pub fn get_or_create(&self, name: &str) -> ExecutionGroup {
        self.lock().get_or_insert(name, self.options)
    }

    /// Explicitly create `name`, following the named groups.
    ///
    /// Followed groups that do not exist yet are created implicitly. Fails
    /// with `GroupConflict` if `name` already exists.
    pub fn make_group(&self, name: &str, follows: &[String]) -> Result<ExecutionGroup> {
        if follows.iter().any(|f| f == name) {
            return Err(LarkError::Argument(format!(
                "group {name:?} cannot follow itself"
            )));
        }

        let mut table = self.lock();
        if table.by_name.contains_key(name) {
            return Err(LarkError::GroupConflict(name.to_string()));
        }

        let mut followed = Vec::with_capacity(follows.len());
        for dep in follows {
            let group = table.get_or_insert(dep, self.options);
            if !followed.iter().any(|g: &ExecutionGroup| g.name() == dep) {
                followed.push(group);
            }
        }

        Ok(table.insert(ExecutionGroup::new(name, followed, self.options)))
    }

    pub fn get(&self, name: &str) -> Option<ExecutionGroup> {
        self.lock().by_name.get(name).cloned()
    }

    /// Snapshot of every registered group, in creation order.
    pub fn snapshot(&self) -> Vec<ExecutionGroup> {
        self.lock().order.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any registered group still has outstanding work.
    pub fn has_pending(&self) -> bool {
        self.lock().order.iter().any(|g| g.outstanding() > 0)
    }

    /// Wait on the named groups, or on every group currently registered if
    /// `names` is empty. Unknown names are created implicitly.
    ///
    /// Every group is waited even after a failure; the first error in
    /// waiting order is returned.
    pub async fn wait_all(&self, names: &[String]) -> Result<()> {
        let groups = if names.is_empty() {
            self.snapshot()
        } else {
            names.iter().map(|n| self.get_or_create(n)).collect()
        };

        let mut first_err = None;
        for group in groups {
            if let Err(err) = group.wait().await {
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
