//! Exp Pool: transparent experience caching for expensive generation calls.
//!
//! This crate re-exports the exp-pool sub-crates for single-import usage.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `eval`, `context`, `manager`, `cache` |
//! | `eval` | Scorers and perfect judges |
//! | `context` | Context builders that fold experiences into the request |
//! | `manager` | In-memory experience manager with exact and semantic lookup |
//! | `cache` | The `ExpCache` decorator and `ExpPool` (pulls in the three above) |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use exp_pool::cache::{CallArgs, ExpPool, ExpPoolConfig};
//!
//! let pool = ExpPool::new(ExpPoolConfig::read_write());
//! let cached = pool.cache::<String>().wrap_async(write_code);
//! let code = cached.invoke(CallArgs::with_req("parse a CSV line")).await?;
//! ```

/// Core types and traits: Experience, Score, CallArgs, ExpPoolError, ExpPoolConfig,
/// and the ExperienceManager, Scorer, PerfectJudge, ContextBuilder seams.
/// Always available.
pub use exp_pool_core as core;

/// NoopScorer, LlmScorer, ExactRequestJudge, SimplePerfectJudge.
#[cfg(feature = "eval")]
pub use exp_pool_eval as eval;

/// PassthroughContextBuilder, SimpleContextBuilder, ExperienceFormatter.
#[cfg(feature = "context")]
pub use exp_pool_context as context;

/// InMemoryExperienceManager and similarity helpers.
#[cfg(feature = "manager")]
pub use exp_pool_manager as manager;

/// ExpPool, ExpCache builder, ExpCached wrapper, sync bridge.
#[cfg(feature = "cache")]
pub use exp_pool_cache as cache;
