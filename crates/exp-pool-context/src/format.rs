use exp_pool_core::Experience;

const EXP_TEMPLATE: &str =
    "Given the request: {req}, We can get the response: {resp}, which scored: {score}.";

/// Renders retrieved experiences as a numbered list.
#[derive(Debug, Clone)]
pub struct ExperienceFormatter {
    template: String,
}

impl ExperienceFormatter {
    pub fn new() -> Self {
        Self {
            template: EXP_TEMPLATE.to_string(),
        }
    }

    /// Use a custom per-experience template with `{req}`, `{resp}` and `{score}` placeholders.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn format_one(&self, exp: &Experience) -> String {
        let score = exp
            .score()
            .map(|s| s.val.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        self.template
            .replace("{req}", exp.req())
            .replace("{resp}", exp.resp())
            .replace("{score}", &score)
    }

    /// One line per experience, numbered from 1.
    pub fn format(&self, exps: &[Experience]) -> String {
        exps.iter()
            .enumerate()
            .map(|(i, exp)| format!("{}. {}", i + 1, self.format_one(exp)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ExperienceFormatter {
    fn default() -> Self {
        Self::new()
    }
}
