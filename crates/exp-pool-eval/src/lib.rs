mod exact_judge;
mod llm_scorer;
mod noop_scorer;
mod simple_judge;

pub use exact_judge::ExactRequestJudge;
pub use llm_scorer::LlmScorer;
pub use noop_scorer::NoopScorer;
pub use simple_judge::SimplePerfectJudge;

pub use exp_pool_core::{PerfectJudge, Scorer};
