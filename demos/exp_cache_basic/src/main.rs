use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use exp_pool::cache::{CallArgs, ExpPool, ExpPoolConfig, ExpPoolError, QueryType};
use exp_pool::core::{LanguageModel, Score, Scorer};
use exp_pool::eval::{LlmScorer, SimplePerfectJudge};
use exp_pool::manager::InMemoryExperienceManager;
use tracing_subscriber::EnvFilter;

/// Stands in for a model that grades responses. Always answers with a top score.
struct GenerousReviewer;

#[async_trait]
impl LanguageModel for GenerousReviewer {
    async fn complete(&self, _prompt: &str) -> Result<String, ExpPoolError> {
        Ok(r#"{"val": 10, "reason": "Reusable as-is."}"#.to_string())
    }
}

/// A scorer whose backing service is down.
struct OfflineScorer;

#[async_trait]
impl Scorer for OfflineScorer {
    async fn evaluate(&self, _req: &str, _resp: &str) -> Result<Score, ExpPoolError> {
        Err(ExpPoolError::Scoring("scoring service unreachable".to_string()))
    }
}

static GENERATIONS: AtomicUsize = AtomicUsize::new(0);

/// The "expensive" call being cached.
async fn write_code(args: CallArgs) -> Result<String, ExpPoolError> {
    GENERATIONS.fetch_add(1, Ordering::SeqCst);
    let task = args.require_req()?.as_str().unwrap_or_default().to_string();
    Ok(format!("// {task}\nfn solve() {{}}"))
}

#[tokio::main]
async fn main() -> Result<(), ExpPoolError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Setup: pool with reads and writes enabled ---
    let config = ExpPoolConfig::read_write();
    let manager = Arc::new(InMemoryExperienceManager::new(config.clone()));
    let pool = ExpPool::with_manager(config, manager.clone());

    let generate = pool
        .text_cache()
        .with_query_type(QueryType::Exact)
        .with_scorer(Arc::new(LlmScorer::new(Arc::new(GenerousReviewer))))
        .with_perfect_judge(Arc::new(SimplePerfectJudge::new()))
        .wrap_async(write_code);

    // --- First call: miss, the function runs and the result is learned ---
    println!("=== Miss (first call) ===");
    let first = generate
        .invoke(CallArgs::with_req("parse a CSV line"))
        .await?;
    println!("Response:\n{first}");
    println!("Stored experiences: {}", manager.count().await);

    // --- Second call: hit, served from the pool ---
    println!("\n=== Hit (same request) ===");
    let second = generate
        .invoke(CallArgs::with_req("parse a CSV line"))
        .await?;
    println!("Same response: {}", first == second);
    println!("Generations so far: {}", GENERATIONS.load(Ordering::SeqCst));

    // --- Sync caller: the same pipeline behind a blocking call ---
    println!("\n=== Sync call from a blocking thread ===");
    let blocking = generate.clone();
    let third = tokio::task::spawn_blocking(move || {
        blocking.call(CallArgs::with_req("parse a CSV line"))
    })
    .await
    .map_err(|e| ExpPoolError::Bridge(e.to_string()))??;
    println!("Same response: {}", first == third);

    // --- Failing scorer: the caller still gets its result ---
    println!("\n=== Absorbed scorer failure ===");
    let unscored = pool
        .cache::<String>()
        .with_name("write_code_unscored")
        .with_scorer(Arc::new(OfflineScorer))
        .wrap_async(write_code);
    let fourth = unscored
        .invoke(CallArgs::with_req("reverse a linked list"))
        .await?;
    println!("Response:\n{fourth}");
    println!("Stored experiences: {}", manager.count().await);

    tracing::info!(
        generations = GENERATIONS.load(Ordering::SeqCst),
        stored = manager.count().await,
        "demo finished"
    );
    println!("\nExperience pool demo completed successfully!");
    Ok(())
}
