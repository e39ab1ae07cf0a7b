use async_trait::async_trait;
use exp_pool_core::{CallArgs, ContextBuilder, ExpPoolError, Experience};
use serde_json::Value;

/// Returns the original `req` unchanged; retrieved experiences are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughContextBuilder;

impl PassthroughContextBuilder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContextBuilder for PassthroughContextBuilder {
    async fn build(&self, _exps: &[Experience], args: &CallArgs) -> Result<Value, ExpPoolError> {
        Ok(args.require_req()?.clone())
    }
}
