use async_trait::async_trait;
use exp_pool_core::{CallArgs, ExpPoolError, Experience, PerfectJudge};

/// Judge that accepts an experience whose stored request equals the current one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactRequestJudge {
    trim: bool,
}

impl ExactRequestJudge {
    pub fn new() -> Self {
        Self { trim: false }
    }

    /// Ignore leading and trailing whitespace when comparing requests.
    pub fn trimmed() -> Self {
        Self { trim: true }
    }
}

#[async_trait]
impl PerfectJudge for ExactRequestJudge {
    async fn is_perfect(
        &self,
        exp: &Experience,
        serialized_req: &str,
        _args: &CallArgs,
    ) -> Result<bool, ExpPoolError> {
        if self.trim {
            Ok(exp.req().trim() == serialized_req.trim())
        } else {
            Ok(exp.req() == serialized_req)
        }
    }
}
