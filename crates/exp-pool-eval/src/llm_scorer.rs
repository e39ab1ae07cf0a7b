use std::sync::Arc;

use async_trait::async_trait;
use exp_pool_core::{ExpPoolError, LanguageModel, Score, Scorer};
use serde::Deserialize;

const DEFAULT_PROMPT_TEMPLATE: &str = r#"## Role
You are an expert reviewer judging how reusable a response is for a request.

## Request
{req}

## Response
{resp}

## Instruction
Rate the response on a scale of 1 to 10, where 1 means useless and 10 means it
can be reused verbatim for the same request. Reply with ONLY a JSON object:
{"val": <integer 1-10>, "reason": "<one sentence>"}"#;

/// Scorer that asks a language model to rate a response.
pub struct LlmScorer {
    model: Arc<dyn LanguageModel>,
    prompt_template: String,
}

impl LlmScorer {
    /// Create a new LLM scorer with the default prompt template.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    /// Create a new LLM scorer with a custom prompt template.
    ///
    /// The template should contain `{req}` and `{resp}` placeholders.
    pub fn with_prompt(model: Arc<dyn LanguageModel>, template: impl Into<String>) -> Self {
        Self {
            model,
            prompt_template: template.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawScore {
    val: i64,
    #[serde(default)]
    reason: String,
}

/// Pull the JSON object out of a model reply, tolerating code fences and chatter.
fn extract_json(text: &str) -> Option<&str> {
    let body = match text.find("```") {
        Some(open) => {
            let after = &text[open + 3..];
            let after = after.strip_prefix("json").unwrap_or(after);
            match after.find("```") {
                Some(close) => &after[..close],
                None => after,
            }
        }
        None => text,
    };
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

fn parse_score(text: &str) -> Result<Score, ExpPoolError> {
    let json = extract_json(text).ok_or_else(|| {
        ExpPoolError::Parsing(format!("no JSON object in scorer response: {text:?}"))
    })?;
    let raw: RawScore = serde_json::from_str(json)
        .map_err(|e| ExpPoolError::Parsing(format!("invalid scorer response {json:?}: {e}")))?;
    Ok(Score::new(raw.val, raw.reason))
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn evaluate(&self, req: &str, resp: &str) -> Result<Score, ExpPoolError> {
        let prompt = self
            .prompt_template
            .replace("{req}", req)
            .replace("{resp}", resp);

        let reply = self.model.complete(&prompt).await?;
        parse_score(&reply)
    }
}
