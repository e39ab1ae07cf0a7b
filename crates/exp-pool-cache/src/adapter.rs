use std::future::Future;
use std::sync::{Arc, OnceLock};

use exp_pool_core::{short_type_name, CallArgs, ExpPoolError};
use futures::future::BoxFuture;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

/// Type-erased async target.
pub type AsyncTargetFn<T> =
    dyn Fn(CallArgs) -> BoxFuture<'static, Result<T, ExpPoolError>> + Send + Sync;
/// Type-erased blocking target.
pub type SyncTargetFn<T> = dyn Fn(CallArgs) -> Result<T, ExpPoolError> + Send + Sync;

/// A wrapped function, with its sync/async nature fixed when it is wrapped.
pub enum Target<T> {
    Async(Arc<AsyncTargetFn<T>>),
    Sync(Arc<SyncTargetFn<T>>),
}

impl<T> Clone for Target<T> {
    fn clone(&self) -> Self {
        match self {
            Target::Async(f) => Target::Async(f.clone()),
            Target::Sync(f) => Target::Sync(f.clone()),
        }
    }
}

impl<T: Send + 'static> Target<T> {
    pub fn from_async<F, Fut>(func: F) -> Self
    where
        F: Fn(CallArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ExpPoolError>> + Send + 'static,
    {
        Target::Async(Arc::new(move |args| Box::pin(func(args))))
    }

    pub fn from_sync<F>(func: F) -> Self
    where
        F: Fn(CallArgs) -> Result<T, ExpPoolError> + Send + Sync + 'static,
    {
        Target::Sync(Arc::new(func))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Target::Async(_))
    }

    /// Run the target under the async contract. Sync targets run inline.
    pub async fn run(&self, args: CallArgs) -> Result<T, ExpPoolError> {
        match self {
            Target::Async(func) => func(args).await,
            Target::Sync(func) => func(args),
        }
    }
}

/// Bare name of a function item, or `None` for closures.
pub fn function_name<F>() -> Option<&'static str> {
    let full = std::any::type_name::<F>();
    if full.contains("{{closure}}") {
        return None;
    }
    Some(short_type_name(full))
}

/// The dedicated runtime that drives sync calls made outside a multi-thread runtime.
/// Built on first use, at most once per process.
fn bridge_runtime() -> Result<&'static Runtime, ExpPoolError> {
    static BRIDGE: OnceLock<Result<Runtime, String>> = OnceLock::new();
    BRIDGE
        .get_or_init(|| {
            tracing::debug!("starting exp pool bridge runtime");
            Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("exp-pool-bridge")
                .enable_all()
                .build()
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| ExpPoolError::Bridge(format!("cannot start bridge runtime: {e}")))
}

/// Drive an async pipeline to completion from synchronous code.
///
/// On a multi-thread tokio runtime the current worker is handed over with
/// `block_in_place`, so nested sync calls are fine. Without a runtime, or on a
/// current-thread runtime, the future runs on the bridge runtime while the
/// caller blocks. Panics inside the future resume on the caller.
///
/// A blocked current-thread runtime makes no progress until this returns:
/// a future that waits on one of its tasks stalls until its own timeout, or
/// forever without one.
pub fn block_on<T, Fut>(fut: Fut) -> Result<T, ExpPoolError>
where
    Fut: Future<Output = Result<T, ExpPoolError>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        if handle.runtime_flavor() == RuntimeFlavor::MultiThread {
            return tokio::task::block_in_place(|| handle.block_on(fut));
        }
        tracing::debug!("sync call parks a current-thread runtime until it finishes");
    }

    let join = bridge_runtime()?.spawn(fut);
    match futures::executor::block_on(join) {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(ExpPoolError::Bridge(format!("bridged call did not finish: {e}"))),
    }
}
