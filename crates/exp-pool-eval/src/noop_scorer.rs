use async_trait::async_trait;
use exp_pool_core::{ExpPoolError, Score, Scorer};

/// Scorer that performs no evaluation and returns the minimum score.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScorer;

impl NoopScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scorer for NoopScorer {
    async fn evaluate(&self, _req: &str, _resp: &str) -> Result<Score, ExpPoolError> {
        Ok(Score::default())
    }
}
