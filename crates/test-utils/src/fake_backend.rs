use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lark::errors::{ProcessError, Result};
use lark::exec::{ProcessBackend, ProcessSpec};

/// A fake process backend that:
/// - records the argv of every command it is asked to run
/// - fails (exit status 1) for programs registered with `fail_program`
/// - optionally sleeps before completing, to widen race windows
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    executed: Arc<Mutex<Vec<Vec<String>>>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_program(mut self, program: &str) -> Self {
        self.failing.insert(program.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared log of executed argv vectors, in completion-start order.
    pub fn executed(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.executed)
    }

    /// Programs (argv[0]) executed so far.
    pub fn programs(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|argv| argv[0].clone())
            .collect()
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn_and_wait<'a>(
        &'a self,
        spec: &'a ProcessSpec,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(spec.argv().to_vec());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.failing.contains(spec.program()) {
                return Err(ProcessError::Exit {
                    program: spec.program().to_string(),
                    code: Some(1),
                }
                .into());
            }
            Ok(())
        })
    }
}
