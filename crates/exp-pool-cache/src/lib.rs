//! Transparent experience caching around expensive calls.
//!
//! An [`ExpCached`] wraps a sync or async function. Each call looks up prior
//! experiences for its request, returns a stored response when a
//! [`PerfectJudge`](exp_pool_core::PerfectJudge) accepts one, and otherwise runs
//! the function and records the new (request, response, score) triple. The
//! recording step never turns a successful call into a failure.
//!
//! ```rust,ignore
//! let pool = ExpPool::new(ExpPoolConfig::read_write());
//! let generate = pool
//!     .cache::<String>()
//!     .with_perfect_judge(Arc::new(ExactRequestJudge::new()))
//!     .wrap_async(write_code);
//! let code = generate.invoke(CallArgs::with_req("parse a CSV line")).await?;
//! ```

mod adapter;
mod cache;
mod handler;
mod hooks;
mod pool;
mod side_effect;

pub use adapter::{block_on, function_name, AsyncTargetFn, SyncTargetFn, Target};
pub use cache::{ExpCache, ExpCached, JudgeFailurePolicy, LearningMode};
pub use hooks::{
    default_req_serialize, default_resp_deserialize, default_resp_serialize, ReqSerializeFn,
    RespDeserializeFn, RespSerializeFn, SerdeHooks,
};
pub use pool::ExpPool;
pub use side_effect::{BestEffort, SideEffectOutcome};

pub use exp_pool_core::{CallArgs, ExpPoolConfig, ExpPoolError, QueryType};
