use async_trait::async_trait;
use exp_pool_core::{CallArgs, ContextBuilder, ExpPoolError, Experience};
use serde_json::Value;

use crate::{value_text, ExperienceFormatter};

const SIMPLE_CONTEXT_TEMPLATE: &str = r#"## Context

### Experiences
-----
{exps}
-----

## User Requirement
{req}

## Instruction
Consider **Experiences** to generate a better answer."#;

/// Folds retrieved experiences into the request as a prompt preamble.
///
/// With no experiences the request passes through untouched.
#[derive(Debug, Clone)]
pub struct SimpleContextBuilder {
    template: String,
    formatter: ExperienceFormatter,
}

impl SimpleContextBuilder {
    pub fn new() -> Self {
        Self {
            template: SIMPLE_CONTEXT_TEMPLATE.to_string(),
            formatter: ExperienceFormatter::new(),
        }
    }

    /// The template should contain `{exps}` and `{req}` placeholders.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_formatter(mut self, formatter: ExperienceFormatter) -> Self {
        self.formatter = formatter;
        self
    }
}

impl Default for SimpleContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextBuilder for SimpleContextBuilder {
    async fn build(&self, exps: &[Experience], args: &CallArgs) -> Result<Value, ExpPoolError> {
        let req = args.require_req()?;
        if exps.is_empty() {
            return Ok(req.clone());
        }

        let rendered = self
            .template
            .replace("{exps}", &self.formatter.format(exps))
            .replace("{req}", &value_text(req));
        Ok(Value::String(rendered))
    }
}
