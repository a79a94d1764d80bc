// src/group/execution_group.rs

//! A single execution group.
//!
//! Work submitted with [`ExecutionGroup::exec`] runs concurrently on the
//! Tokio runtime. Each group tracks how many items are outstanding and
//! records the errors they produce. A group may *follow* other groups: none
//! of its work starts before every followed group has drained.
//!
//! Submissions made during one poll of a [`batched`] future are counted at
//! once but only released to the runtime when that poll returns. Task
//! bodies and group work always run batched, so a body that submits to a
//! follower before the group it follows still gets the ordering on a
//! multi-threaded runtime.

use std::cell::RefCell;
use std::fmt;
use std::future::{poll_fn, Future};
use std::pin::{pin, Pin};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::errors::{LarkError, Result};
use crate::types::ErrorMode;

type HeldWork = (Handle, Pin<Box<dyn Future<Output = ()> + Send>>);

thread_local! {
    /// Work submitted during the current batched poll on this thread.
    /// `None` outside any batched poll.
    static HELD: RefCell<Option<Vec<HeldWork>>> = const { RefCell::new(None) };
}

/// Drive `fut`, holding back group work it submits until each of its polls
/// returns.
///
/// Nested batches on the same poll defer to the outermost one. Outside any
/// batch, [`ExecutionGroup::exec`] releases work immediately, which is only
/// order-safe on a current-thread runtime.
pub async fn batched<F: Future>(fut: F) -> F::Output {
    let mut fut = pin!(fut);
    poll_fn(move |cx| {
        let _batch = Batch::enter();
        fut.as_mut().poll(cx)
    })
    .await
}

struct Batch {
    outermost: bool,
}

impl Batch {
    fn enter() -> Self {
        let outermost = HELD.with_borrow_mut(|held| {
            if held.is_some() {
                false
            } else {
                *held = Some(Vec::new());
                true
            }
        });
        Self { outermost }
    }
}

impl Drop for Batch {
    // Also runs on unwind: held items are already counted and must run.
    fn drop(&mut self) {
        if !self.outermost {
            return;
        }
        let released = HELD.with_borrow_mut(Option::take).unwrap_or_default();
        for (handle, work) in released {
            handle.spawn(work);
        }
    }
}

fn hold_or_release(handle: Handle, work: Pin<Box<dyn Future<Output = ()> + Send>>) {
    let unheld = HELD.with_borrow_mut(|held| match held {
        Some(queue) => {
            queue.push((handle, work));
            None
        }
        None => Some((handle, work)),
    });
    if let Some((handle, work)) = unheld {
        handle.spawn(work);
    }
}

/// Settings shared by every group of one registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupOptions {
    pub error_mode: ErrorMode,
    /// Log discarded errors at `warn` rather than `debug`.
    pub verbose: bool,
}

/// Cheap-to-clone handle to a group.
#[derive(Clone)]
pub struct ExecutionGroup {
    inner: Arc<GroupInner>,
}

struct GroupInner {
    name: String,
    follows: Vec<ExecutionGroup>,
    /// Number of scheduled items that have not finished yet.
    outstanding: watch::Sender<usize>,
    /// Recorded errors, oldest first. Holds at most one in `FirstWins` mode.
    errors: Mutex<Vec<LarkError>>,
    options: GroupOptions,
}

impl fmt::Debug for ExecutionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionGroup")
            .field("name", &self.inner.name)
            .field("follows", &self.follows())
            .field("outstanding", &self.outstanding())
            .finish_non_exhaustive()
    }
}

impl ExecutionGroup {
    pub(crate) fn new(name: &str, follows: Vec<ExecutionGroup>, options: GroupOptions) -> Self {
        let (outstanding, _) = watch::channel(0usize);
        Self {
            inner: Arc::new(GroupInner {
                name: name.to_string(),
                follows,
                outstanding,
                errors: Mutex::new(Vec::new()),
                options,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Names of the groups this group follows.
    pub fn follows(&self) -> Vec<&str> {
        self.inner.follows.iter().map(|g| g.name()).collect()
    }

    pub fn outstanding(&self) -> usize {
        *self.inner.outstanding.borrow()
    }

    /// Schedule `work` to run concurrently.
    ///
    /// The outstanding counter is incremented before this returns. Inside a
    /// [`batched`] poll the item is released when that poll returns, so
    /// everything submitted up to the submitter's next suspension point is
    /// counted before any of it checks a followed group.
    /// `work` itself does not start until every followed group has drained.
    /// Its result is never returned here; failures land in the group's
    /// error slot and surface through [`wait`](Self::wait).
    ///
    /// Fails only when there is no Tokio runtime to schedule on.
    pub fn exec<F>(&self, work: F) -> Result<()>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|e| {
            LarkError::from(anyhow!(
                "cannot schedule work in group {:?}: {e}",
                self.inner.name
            ))
        })?;

        self.inner.outstanding.send_modify(|n| *n += 1);

        let group = self.clone();
        let item = Box::pin(async move {
            for followed in &group.inner.follows {
                followed.drained().await;
            }

            debug!(group = %group.name(), "group work starting");

            // Run the work as its own task so a panic is observed here and
            // the counter still comes down.
            let result = match tokio::spawn(batched(work)).await {
                Ok(result) => result,
                Err(join_err) => Err(LarkError::from(anyhow!(
                    "scheduled work panicked: {join_err}"
                ))),
            };

            if let Err(err) = result {
                group.record(err);
            }
            group.finish_one();
        });
        hold_or_release(handle, item);

        Ok(())
    }

    /// Block until this group's outstanding work reaches zero and every
    /// followed group has drained. Returns the first recorded error, if any.
    ///
    /// Idempotent: repeated calls return the same recorded error.
    pub async fn wait(&self) -> Result<()> {
        for followed in &self.inner.follows {
            followed.drained().await;
        }
        self.drained().await;

        match self.first_error() {
            Some(err) => Err(LarkError::asynchronous(self.name(), err)),
            None => Ok(()),
        }
    }

    /// The first error recorded by this group, if any.
    pub fn first_error(&self) -> Option<LarkError> {
        self.lock_errors().first().cloned()
    }

    /// All recorded errors. Only ever more than one in `Accumulate` mode.
    pub fn errors(&self) -> Vec<LarkError> {
        self.lock_errors().clone()
    }

    /// Resolves once the outstanding counter is observed at zero.
    pub(crate) async fn drained(&self) {
        let mut rx = self.inner.outstanding.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    fn record(&self, err: LarkError) {
        let mut errors = self.lock_errors();
        let keep = errors.is_empty() || self.inner.options.error_mode == ErrorMode::Accumulate;

        if !keep || !errors.is_empty() {
            if self.inner.options.verbose {
                warn!(group = %self.name(), error = %err, "additional group error");
            } else {
                debug!(group = %self.name(), error = %err, "additional group error");
            }
        }

        if keep {
            errors.push(err);
        }
    }

    fn finish_one(&self) {
        self.inner.outstanding.send_modify(|n| {
            debug_assert!(*n > 0, "outstanding counter underflow");
            *n = n.saturating_sub(1);
        });
    }

    fn lock_errors(&self) -> std::sync::MutexGuard<'_, Vec<LarkError>> {
        self.inner.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
