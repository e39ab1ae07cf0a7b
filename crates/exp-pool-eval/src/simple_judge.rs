use async_trait::async_trait;
use exp_pool_core::{CallArgs, ExpPoolError, Experience, PerfectJudge, Score};

/// Judge that requires both an identical request and a top score.
///
/// Experiences stored without a score are never perfect.
#[derive(Debug, Clone, Copy)]
pub struct SimplePerfectJudge {
    min_score: u8,
}

impl SimplePerfectJudge {
    pub fn new() -> Self {
        Self {
            min_score: Score::MAX,
        }
    }

    /// Accept stored scores of at least `min_score` instead of only the maximum.
    pub fn with_min_score(min_score: u8) -> Self {
        Self {
            min_score: min_score.clamp(Score::MIN, Score::MAX),
        }
    }
}

impl Default for SimplePerfectJudge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PerfectJudge for SimplePerfectJudge {
    async fn is_perfect(
        &self,
        exp: &Experience,
        serialized_req: &str,
        _args: &CallArgs,
    ) -> Result<bool, ExpPoolError> {
        let scored_high = exp
            .score()
            .map(|score| score.val >= self.min_score)
            .unwrap_or(false);
        Ok(scored_high && exp.req() == serialized_req)
    }
}
