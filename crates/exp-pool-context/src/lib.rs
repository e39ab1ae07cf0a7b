mod format;
mod passthrough;
mod simple;

pub use format::ExperienceFormatter;
pub use passthrough::PassthroughContextBuilder;
pub use simple::SimpleContextBuilder;

pub use exp_pool_core::ContextBuilder;

use serde_json::Value;

/// Render a request value as prompt text: strings verbatim, anything else as JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
