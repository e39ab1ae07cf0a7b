use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Query type
// ---------------------------------------------------------------------------

/// Retrieval strategy handed through to the [`ExperienceManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Only experiences whose stored request equals the query.
    Exact,
    /// Experiences in the semantic neighborhood of the query.
    #[default]
    Semantic,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Exact => f.write_str("exact"),
            QueryType::Semantic => f.write_str("semantic"),
        }
    }
}

// ---------------------------------------------------------------------------
// Score / Metric
// ---------------------------------------------------------------------------

/// Quality of a stored response on a 1..=10 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub val: u8,
    #[serde(default)]
    pub reason: String,
}

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Create a score, clamping `val` into `MIN..=MAX`.
    pub fn new(val: i64, reason: impl Into<String>) -> Self {
        let val = val.clamp(Self::MIN as i64, Self::MAX as i64) as u8;
        Self {
            val,
            reason: reason.into(),
        }
    }

    /// The best possible score.
    pub fn perfect(reason: impl Into<String>) -> Self {
        Self::new(Self::MAX as i64, reason)
    }

    pub fn is_perfect(&self) -> bool {
        self.val == Self::MAX
    }
}

impl Default for Score {
    fn default() -> Self {
        Self {
            val: Self::MIN,
            reason: String::new(),
        }
    }
}

/// Cost and quality measurements attached to an experience.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metric {
    /// Milliseconds spent producing the response.
    #[serde(default)]
    pub time_cost: f64,
    #[serde(default)]
    pub money_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
}

impl Metric {
    pub fn with_score(score: Score) -> Self {
        Self {
            score: Some(score),
            ..Default::default()
        }
    }

    pub fn with_time_cost(mut self, millis: f64) -> Self {
        self.time_cost = millis;
        self
    }

    pub fn with_money_cost(mut self, cost: f64) -> Self {
        self.money_cost = cost;
        self
    }
}

// ---------------------------------------------------------------------------
// Experience
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceType {
    #[default]
    Success,
    Failure,
    Insight,
}

/// How an experience entered the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Automatic,
    Manual,
}

/// A persisted (request, response, tag, score) record.
///
/// Fields are only reachable through accessors: once an experience is built
/// and handed to a manager it is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    req: String,
    resp: String,
    tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metric: Option<Metric>,
    #[serde(default)]
    exp_type: ExperienceType,
    #[serde(default)]
    entry_type: EntryType,
    uuid: Uuid,
    timestamp: DateTime<Utc>,
}

impl Experience {
    /// Create an experience for the given call site. The tag must not be empty.
    pub fn new(
        req: impl Into<String>,
        resp: impl Into<String>,
        tag: impl Into<String>,
    ) -> Result<Self, ExpPoolError> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(ExpPoolError::Config(
                "experience tag must not be empty".to_string(),
            ));
        }
        Ok(Self {
            req: req.into(),
            resp: resp.into(),
            tag,
            metric: None,
            exp_type: ExperienceType::default(),
            entry_type: EntryType::default(),
            uuid: Uuid::new_v4(),
            timestamp: Utc::now(),
        })
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn with_exp_type(mut self, exp_type: ExperienceType) -> Self {
        self.exp_type = exp_type;
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    pub fn req(&self) -> &str {
        &self.req
    }

    pub fn resp(&self) -> &str {
        &self.resp
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn metric(&self) -> Option<&Metric> {
        self.metric.as_ref()
    }

    /// Shortcut for `metric().score`.
    pub fn score(&self) -> Option<&Score> {
        self.metric.as_ref().and_then(|m| m.score.as_ref())
    }

    pub fn exp_type(&self) -> ExperienceType {
        self.exp_type
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// ---------------------------------------------------------------------------
// Call arguments
// ---------------------------------------------------------------------------

/// The arguments of one call into a cached function.
///
/// Mirrors a positional/keyword calling convention: `req` must be present among
/// the keyword arguments. `receiver` names the type of the instance a method is
/// called on and drives default tag derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl CallArgs {
    pub const REQ: &'static str = "req";

    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments carrying only the `req` keyword.
    pub fn with_req(req: impl Into<Value>) -> Self {
        Self::new().kwarg(Self::REQ, req)
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Mark these arguments as a method call on `instance`.
    pub fn on<T: ?Sized>(mut self, instance: &T) -> Self {
        let full = std::any::type_name_of_val(instance);
        self.receiver = Some(short_type_name(full).to_string());
        self
    }

    /// Mark these arguments as a method call on a value of type `T`.
    pub fn on_type<T: ?Sized>(mut self) -> Self {
        self.receiver = Some(short_type_name(std::any::type_name::<T>()).to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }

    pub fn req(&self) -> Option<&Value> {
        self.kwargs.get(Self::REQ)
    }

    /// The `req` keyword, or a configuration error when it was not supplied.
    pub fn require_req(&self) -> Result<&Value, ExpPoolError> {
        self.req().ok_or_else(|| {
            ExpPoolError::Config("`req` must be provided as a keyword argument".to_string())
        })
    }

    /// Swap `req` for an augmented request, returning the previous value.
    pub fn replace_req(&mut self, req: Value) -> Option<Value> {
        self.kwargs.insert(Self::REQ.to_string(), req)
    }
}

/// Reduce a full Rust type path to its bare type name.
///
/// `&my_app::agents::Engineer<T>` becomes `Engineer`.
pub fn short_type_name(full: &str) -> &str {
    let trimmed = full.trim_start_matches('&').trim_start_matches("mut ");
    let base = match trimmed.find('<') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    base.rsplit("::").next().unwrap_or(base)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for the experience pool with variants covering all subsystems.
#[derive(Debug, Error)]
pub enum ExpPoolError {
    #[error("config error: {0}")]
    Config(String),
    #[error("retrieval error: {0}")]
    Retrieval(String),
    #[error("judge error: {0}")]
    Judge(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("scoring error: {0}")]
    Scoring(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("model error: {0}")]
    Model(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("parsing error: {0}")]
    Parsing(String),
    #[error("bridge error: {0}")]
    Bridge(String),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Process-level settings for the experience pool.
///
/// Built once at startup and injected; nothing in the pool reads it implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpPoolConfig {
    pub enabled: bool,
    pub enable_read: bool,
    pub enable_write: bool,
    pub query_top_k: usize,
    pub similarity_threshold: f32,
}

impl Default for ExpPoolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            enable_read: false,
            enable_write: false,
            query_top_k: 10,
            similarity_threshold: 0.0,
        }
    }
}

impl ExpPoolConfig {
    pub const ENV_ENABLED: &'static str = "EXP_POOL_ENABLED";
    pub const ENV_ENABLE_READ: &'static str = "EXP_POOL_ENABLE_READ";
    pub const ENV_ENABLE_WRITE: &'static str = "EXP_POOL_ENABLE_WRITE";
    pub const ENV_TOP_K: &'static str = "EXP_POOL_TOP_K";
    pub const ENV_SIMILARITY_THRESHOLD: &'static str = "EXP_POOL_SIMILARITY_THRESHOLD";

    /// Pool enabled with both reads and writes turned on.
    pub fn read_write() -> Self {
        Self {
            enabled: true,
            enable_read: true,
            enable_write: true,
            ..Default::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_read(mut self, enable_read: bool) -> Self {
        self.enable_read = enable_read;
        self
    }

    pub fn with_write(mut self, enable_write: bool) -> Self {
        self.enable_write = enable_write;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.query_top_k = top_k;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn read_enabled(&self) -> bool {
        self.enabled && self.enable_read
    }

    pub fn write_enabled(&self) -> bool {
        self.enabled && self.enable_write
    }

    /// Parse a JSON document; missing keys fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, ExpPoolError> {
        serde_json::from_str(json)
            .map_err(|e| ExpPoolError::Config(format!("invalid exp pool config: {e}")))
    }

    /// Read the `EXP_POOL_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ExpPoolError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ExpPoolError> {
        let mut config = Self::default();
        if let Some(v) = lookup(Self::ENV_ENABLED) {
            config.enabled = parse_flag(Self::ENV_ENABLED, &v)?;
        }
        if let Some(v) = lookup(Self::ENV_ENABLE_READ) {
            config.enable_read = parse_flag(Self::ENV_ENABLE_READ, &v)?;
        }
        if let Some(v) = lookup(Self::ENV_ENABLE_WRITE) {
            config.enable_write = parse_flag(Self::ENV_ENABLE_WRITE, &v)?;
        }
        if let Some(v) = lookup(Self::ENV_TOP_K) {
            config.query_top_k = v.trim().parse().map_err(|_| {
                ExpPoolError::Config(format!("{}: expected an integer, got {v:?}", Self::ENV_TOP_K))
            })?;
        }
        if let Some(v) = lookup(Self::ENV_SIMILARITY_THRESHOLD) {
            config.similarity_threshold = v
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|t| t.is_finite())
                .ok_or_else(|| {
                    ExpPoolError::Config(format!(
                        "{}: expected a number, got {v:?}",
                        Self::ENV_SIMILARITY_THRESHOLD
                    ))
                })?;
        }
        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ExpPoolError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ExpPoolError::Config(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Stores and queries experiences. Owns identity, ranking and dedup policy.
#[async_trait]
pub trait ExperienceManager: Send + Sync {
    /// Experiences matching `req` under `query_type`, scoped to `tag`.
    async fn query(
        &self,
        req: &str,
        query_type: QueryType,
        tag: &str,
    ) -> Result<Vec<Experience>, ExpPoolError>;

    /// Persist a new experience. Append-only.
    async fn create(&self, exp: Experience) -> Result<(), ExpPoolError>;
}

/// Rates a freshly produced response for future reuse.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn evaluate(&self, req: &str, resp: &str) -> Result<Score, ExpPoolError>;
}

/// Decides whether a retrieved experience can be returned as-is.
///
/// Implementations must not depend on being called once: the orchestrator may
/// ask about several candidates per call.
#[async_trait]
pub trait PerfectJudge: Send + Sync {
    async fn is_perfect(
        &self,
        exp: &Experience,
        serialized_req: &str,
        args: &CallArgs,
    ) -> Result<bool, ExpPoolError>;
}

/// Turns retrieved experiences plus the current arguments into the request
/// actually passed to the wrapped function.
#[async_trait]
pub trait ContextBuilder: Send + Sync {
    async fn build(&self, exps: &[Experience], args: &CallArgs) -> Result<Value, ExpPoolError>;
}

/// Trait for embedding text into vectors.
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Embed multiple texts (for batch document embedding).
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ExpPoolError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ExpPoolError>;
}

/// Minimal text-completion model used by model-backed scorers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ExpPoolError>;
}
