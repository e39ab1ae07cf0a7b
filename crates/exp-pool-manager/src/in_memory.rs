use std::sync::Arc;

use async_trait::async_trait;
use exp_pool_core::{
    Embeddings, ExpPoolConfig, ExpPoolError, Experience, ExperienceManager, QueryType,
};
use tokio::sync::RwLock;

use crate::similarity::{cosine_similarity, lexical_similarity};

struct StoredExperience {
    exp: Experience,
    embedding: Option<Vec<f32>>,
}

/// Append-only, in-process experience store.
///
/// Semantic queries rank by cosine similarity when an [`Embeddings`] provider is
/// attached, and by word overlap otherwise. Reads and writes are gated by the
/// pool configuration: a disabled read returns nothing, a disabled write is
/// silently dropped.
pub struct InMemoryExperienceManager {
    config: ExpPoolConfig,
    embeddings: Option<Arc<dyn Embeddings>>,
    entries: RwLock<Vec<StoredExperience>>,
}

impl InMemoryExperienceManager {
    pub fn new(config: ExpPoolConfig) -> Self {
        Self {
            config,
            embeddings: None,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Rank semantic queries by embedding similarity.
    ///
    /// Experiences are embedded when they are created, so attach the provider
    /// before the first write.
    pub fn with_embeddings(mut self, embeddings: Arc<dyn Embeddings>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn config(&self) -> &ExpPoolConfig {
        &self.config
    }

    /// Persist several experiences in order.
    pub async fn create_many(&self, exps: Vec<Experience>) -> Result<(), ExpPoolError> {
        for exp in exps {
            self.create(exp).await?;
        }
        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Snapshot of every stored experience in insertion order.
    pub async fn all(&self) -> Vec<Experience> {
        self.entries
            .read()
            .await
            .iter()
            .map(|entry| entry.exp.clone())
            .collect()
    }

    pub async fn delete_all(&self) {
        self.entries.write().await.clear();
    }

    async fn query_exact(&self, req: &str, tag: &str) -> Vec<Experience> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|entry| tag_matches(&entry.exp, tag) && entry.exp.req() == req)
            .map(|entry| entry.exp.clone())
            .collect()
    }

    async fn query_semantic(&self, req: &str, tag: &str) -> Result<Vec<Experience>, ExpPoolError> {
        let query_embedding = match &self.embeddings {
            Some(embeddings) => Some(embeddings.embed_query(req).await.map_err(|e| {
                ExpPoolError::Retrieval(format!("embedding error during query: {e}"))
            })?),
            None => None,
        };

        let entries = self.entries.read().await;
        let mut ranked: Vec<(f32, &Experience)> = Vec::new();

        for entry in entries.iter().filter(|entry| tag_matches(&entry.exp, tag)) {
            let similarity = match (&query_embedding, &entry.embedding) {
                // identical requests always match, even with no words to compare
                _ if entry.exp.req() == req => 1.0,
                (Some(query), Some(stored)) => cosine_similarity(query, stored),
                (Some(_), None) => continue,
                (None, _) => {
                    let sim = lexical_similarity(req, entry.exp.req());
                    if sim <= 0.0 {
                        continue;
                    }
                    sim
                }
            };
            if similarity >= self.config.similarity_threshold {
                ranked.push((similarity, &entry.exp));
            }
        }

        // Stable sort: equal similarities keep insertion order.
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        if self.config.query_top_k > 0 {
            ranked.truncate(self.config.query_top_k);
        }

        Ok(ranked.into_iter().map(|(_, exp)| exp.clone()).collect())
    }
}

impl Default for InMemoryExperienceManager {
    fn default() -> Self {
        Self::new(ExpPoolConfig::default())
    }
}

/// An empty query tag matches every call site.
fn tag_matches(exp: &Experience, tag: &str) -> bool {
    tag.is_empty() || exp.tag() == tag
}

#[async_trait]
impl ExperienceManager for InMemoryExperienceManager {
    async fn query(
        &self,
        req: &str,
        query_type: QueryType,
        tag: &str,
    ) -> Result<Vec<Experience>, ExpPoolError> {
        if !self.config.read_enabled() {
            return Ok(Vec::new());
        }

        let exps = match query_type {
            QueryType::Exact => self.query_exact(req, tag).await,
            QueryType::Semantic => self.query_semantic(req, tag).await?,
        };
        tracing::debug!(tag = %tag, query_type = %query_type, found = exps.len(), "queried experiences");
        Ok(exps)
    }

    async fn create(&self, exp: Experience) -> Result<(), ExpPoolError> {
        if !self.config.write_enabled() {
            return Ok(());
        }

        let embedding = match &self.embeddings {
            Some(embeddings) => Some(embeddings.embed_query(exp.req()).await.map_err(|e| {
                ExpPoolError::Storage(format!("embedding error during create: {e}"))
            })?),
            None => None,
        };

        tracing::debug!(tag = %exp.tag(), uuid = %exp.uuid(), "stored experience");
        self.entries
            .write()
            .await
            .push(StoredExperience { exp, embedding });
        Ok(())
    }
}
