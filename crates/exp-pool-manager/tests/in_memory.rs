use std::sync::Arc;

use async_trait::async_trait;
use exp_pool_core::{Embeddings, ExpPoolConfig, ExpPoolError, Experience, QueryType};
use exp_pool_manager::{ExperienceManager, InMemoryExperienceManager};

fn exp(req: &str, resp: &str, tag: &str) -> Experience {
    Experience::new(req, resp, tag).unwrap()
}

fn manager() -> InMemoryExperienceManager {
    InMemoryExperienceManager::new(ExpPoolConfig::read_write())
}

/// Deterministic embeddings: byte sums folded into a few buckets, normalized.
struct FakeEmbeddings {
    dimensions: usize,
}

fn text_to_vector(text: &str, dimensions: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dimensions];
    for (i, byte) in text.bytes().enumerate() {
        vec[i % dimensions] += byte as f32;
    }
    let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in &mut vec {
            *x /= magnitude;
        }
    }
    vec
}

#[async_trait]
impl Embeddings for FakeEmbeddings {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ExpPoolError> {
        Ok(texts.iter().map(|t| text_to_vector(t, self.dimensions)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ExpPoolError> {
        Ok(text_to_vector(text, self.dimensions))
    }
}

struct BrokenEmbeddings;

#[async_trait]
impl Embeddings for BrokenEmbeddings {
    async fn embed_documents(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, ExpPoolError> {
        Err(ExpPoolError::Embedding("offline".to_string()))
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, ExpPoolError> {
        Err(ExpPoolError::Embedding("offline".to_string()))
    }
}

#[tokio::test]
async fn exact_query_filters_by_req_and_tag() {
    let m = manager();
    m.create(exp("sort a list", "r1", "Engineer.write")).await.unwrap();
    m.create(exp("sort a list", "r2", "Engineer.review")).await.unwrap();
    m.create(exp("sort a vec", "r3", "Engineer.write")).await.unwrap();
    m.create(exp("sort a list", "r4", "Engineer.write")).await.unwrap();

    let found = m
        .query("sort a list", QueryType::Exact, "Engineer.write")
        .await
        .unwrap();
    let resps: Vec<&str> = found.iter().map(|e| e.resp()).collect();
    assert_eq!(resps, vec!["r1", "r4"]);
}

#[tokio::test]
async fn empty_tag_matches_all_call_sites() {
    let m = manager();
    m.create(exp("q", "a", "one")).await.unwrap();
    m.create(exp("q", "b", "two")).await.unwrap();

    let found = m.query("q", QueryType::Exact, "").await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn semantic_query_ranks_by_word_overlap() {
    let m = manager();
    m.create(exp("sort a vec of numbers", "weak", "t")).await.unwrap();
    m.create(exp("cook pasta", "none", "t")).await.unwrap();
    m.create(exp("sort a list of numbers", "strong", "t")).await.unwrap();

    let found = m
        .query("sort a list of numbers", QueryType::Semantic, "t")
        .await
        .unwrap();
    let resps: Vec<&str> = found.iter().map(|e| e.resp()).collect();
    assert_eq!(resps, vec!["strong", "weak"]);
}

#[tokio::test]
async fn semantic_query_finds_identical_wordless_request() {
    let m = manager();
    for req in ["???", "", "+-*/"] {
        m.create(exp(req, "stored", "t")).await.unwrap();
    }
    m.create(exp("what now", "other", "t")).await.unwrap();

    for req in ["???", "", "+-*/"] {
        let found = m.query(req, QueryType::Semantic, "t").await.unwrap();
        assert_eq!(found.len(), 1, "request {req:?}");
        assert_eq!(found[0].req(), req);
    }
}

#[tokio::test]
async fn semantic_query_respects_top_k_and_threshold() {
    let config = ExpPoolConfig::read_write().with_top_k(1);
    let m = InMemoryExperienceManager::new(config);
    m.create(exp("alpha beta", "1", "t")).await.unwrap();
    m.create(exp("alpha beta gamma", "2", "t")).await.unwrap();
    assert_eq!(m.query("alpha beta", QueryType::Semantic, "t").await.unwrap().len(), 1);

    let config = ExpPoolConfig::read_write().with_similarity_threshold(0.9);
    let m = InMemoryExperienceManager::new(config);
    m.create(exp("alpha beta", "1", "t")).await.unwrap();
    m.create(exp("alpha beta gamma", "2", "t")).await.unwrap();
    let found = m.query("alpha beta", QueryType::Semantic, "t").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].resp(), "1");
}

#[tokio::test]
async fn semantic_query_with_embeddings_finds_exact_text() {
    let m = manager().with_embeddings(Arc::new(FakeEmbeddings { dimensions: 4 }));
    m.create(exp("What is Rust?", "a language", "t")).await.unwrap();
    m.create(exp("How do I cook pasta with tomatoes?", "boil", "t")).await.unwrap();

    let found = m.query("What is Rust?", QueryType::Semantic, "t").await.unwrap();
    assert!(!found.is_empty());
    assert_eq!(found[0].resp(), "a language");
}

#[tokio::test]
async fn embedding_failure_during_query_is_retrieval_error() {
    let m = manager().with_embeddings(Arc::new(BrokenEmbeddings));
    let err = m.query("q", QueryType::Semantic, "t").await.unwrap_err();
    assert!(matches!(err, ExpPoolError::Retrieval(_)));
}

#[tokio::test]
async fn embedding_failure_during_create_is_storage_error() {
    let m = manager().with_embeddings(Arc::new(BrokenEmbeddings));
    let err = m.create(exp("q", "a", "t")).await.unwrap_err();
    assert!(matches!(err, ExpPoolError::Storage(_)));
    assert_eq!(m.count().await, 0);
}

#[tokio::test]
async fn disabled_read_returns_nothing() {
    let config = ExpPoolConfig::read_write().with_read(false);
    let m = InMemoryExperienceManager::new(config);
    m.create(exp("q", "a", "t")).await.unwrap();

    assert_eq!(m.count().await, 1);
    assert!(m.query("q", QueryType::Exact, "t").await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_write_drops_experiences() {
    let config = ExpPoolConfig::read_write().with_write(false);
    let m = InMemoryExperienceManager::new(config);
    m.create(exp("q", "a", "t")).await.unwrap();
    assert_eq!(m.count().await, 0);
}

#[tokio::test]
async fn create_is_append_only() {
    let m = manager();
    m.create_many(vec![exp("q", "a", "t"), exp("q", "a", "t")]).await.unwrap();
    assert_eq!(m.count().await, 2);

    let all = m.all().await;
    assert_ne!(all[0].uuid(), all[1].uuid());

    m.delete_all().await;
    assert_eq!(m.count().await, 0);
}
