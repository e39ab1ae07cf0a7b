use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use exp_pool_core::ExpPoolError;
use futures::FutureExt;

/// How a best-effort side effect ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffectOutcome {
    Completed,
    /// The effect failed or panicked; the message was logged and dropped.
    Absorbed(String),
}

impl SideEffectOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SideEffectOutcome::Completed)
    }
}

/// A side effect whose failure must never reach the caller.
///
/// Errors and panics are caught, logged at `warn`, and reported as
/// [`SideEffectOutcome::Absorbed`]. Nothing is retried.
pub struct BestEffort<F> {
    label: &'static str,
    fut: F,
}

impl<F> BestEffort<F>
where
    F: Future<Output = Result<(), ExpPoolError>>,
{
    pub fn new(label: &'static str, fut: F) -> Self {
        Self { label, fut }
    }

    /// Await the effect in place.
    pub async fn run(self) -> SideEffectOutcome {
        let label = self.label;
        match AssertUnwindSafe(self.fut).catch_unwind().await {
            Ok(Ok(())) => SideEffectOutcome::Completed,
            Ok(Err(e)) => {
                tracing::warn!(effect = label, error = %e, "side effect failed, absorbed");
                SideEffectOutcome::Absorbed(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::warn!(effect = label, panic = %message, "side effect panicked, absorbed");
                SideEffectOutcome::Absorbed(message)
            }
        }
    }

    /// Detach the effect onto the current tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<SideEffectOutcome>
    where
        F: Send + 'static,
    {
        tokio::spawn(self.run())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
