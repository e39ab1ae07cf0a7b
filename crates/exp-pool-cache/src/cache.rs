use std::future::Future;
use std::sync::Arc;

use exp_pool_context::PassthroughContextBuilder;
use exp_pool_core::{
    CallArgs, ContextBuilder, ExpPoolError, ExperienceManager, PerfectJudge, QueryType, Scorer,
};
use exp_pool_eval::{ExactRequestJudge, NoopScorer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::adapter::{self, function_name, Target};
use crate::handler::{run_cached, CacheSettings};
use crate::hooks::SerdeHooks;

/// What to do when the perfect judge fails on a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JudgeFailurePolicy {
    /// Fail the call with the judge's error.
    #[default]
    Propagate,
    /// Log the error and move on to the next candidate.
    TreatAsImperfect,
}

/// When the scoring and persistence step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LearningMode {
    /// Awaited before the call returns. Failures are still absorbed.
    #[default]
    Inline,
    /// Spawned on the current runtime; the call returns immediately.
    Background,
}

/// Builder for an experience-cached function.
///
/// Every collaborator is optional: the defaults are the pool's manager,
/// [`NoopScorer`], [`ExactRequestJudge`], [`PassthroughContextBuilder`] and
/// JSON serialization hooks. Whether caching is active at all is taken from
/// the pool's `read_enabled()` flag when the builder is created.
pub struct ExpCache<T> {
    enabled: bool,
    query_type: QueryType,
    manager: Arc<dyn ExperienceManager>,
    scorer: Arc<dyn Scorer>,
    perfect_judge: Arc<dyn PerfectJudge>,
    context_builder: Arc<dyn ContextBuilder>,
    hooks: SerdeHooks<T>,
    tag: Option<String>,
    name: Option<String>,
    judge_failure: JudgeFailurePolicy,
    learning: LearningMode,
}

impl<T> ExpCache<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// A builder using JSON serialization hooks.
    pub fn new(manager: Arc<dyn ExperienceManager>, enabled: bool) -> Self {
        Self::with_hooks(manager, enabled, SerdeHooks::json())
    }
}

impl ExpCache<String> {
    /// A builder for `String` responses stored as plain text.
    pub fn text(manager: Arc<dyn ExperienceManager>, enabled: bool) -> Self {
        Self::with_hooks(manager, enabled, SerdeHooks::text())
    }
}

impl<T: Send + 'static> ExpCache<T> {
    /// A builder for response types without serde support.
    pub fn with_hooks(
        manager: Arc<dyn ExperienceManager>,
        enabled: bool,
        hooks: SerdeHooks<T>,
    ) -> Self {
        Self {
            enabled,
            query_type: QueryType::default(),
            manager,
            scorer: Arc::new(NoopScorer::new()),
            perfect_judge: Arc::new(ExactRequestJudge::new()),
            context_builder: Arc::new(PassthroughContextBuilder::new()),
            hooks,
            tag: None,
            name: None,
            judge_failure: JudgeFailurePolicy::default(),
            learning: LearningMode::default(),
        }
    }

    /// Retrieval mode passed to the manager. Defaults to semantic.
    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    /// Use a different manager than the pool's.
    pub fn with_manager(mut self, manager: Arc<dyn ExperienceManager>) -> Self {
        self.manager = manager;
        self
    }

    /// Scorer applied to fresh responses before they are stored.
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Judge deciding whether a stored experience can be returned as-is.
    pub fn with_perfect_judge(mut self, judge: Arc<dyn PerfectJudge>) -> Self {
        self.perfect_judge = judge;
        self
    }

    /// Builder that turns retrieved experiences into the request passed to the function.
    pub fn with_context_builder(mut self, builder: Arc<dyn ContextBuilder>) -> Self {
        self.context_builder = builder;
        self
    }

    /// Override how `req` becomes lookup key material.
    pub fn with_req_serialize(
        mut self,
        f: impl Fn(&Value) -> Result<String, ExpPoolError> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.req_serialize = Arc::new(f);
        self
    }

    /// Override how a response is stored.
    pub fn with_resp_serialize(
        mut self,
        f: impl Fn(&T) -> Result<String, ExpPoolError> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.resp_serialize = Arc::new(f);
        self
    }

    /// Override how a stored response is turned back into `T`.
    pub fn with_resp_deserialize(
        mut self,
        f: impl Fn(&str) -> Result<T, ExpPoolError> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.resp_deserialize = Arc::new(f);
        self
    }

    /// Fix the tag instead of deriving it per call. Blank tags are ignored.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = (!tag.trim().is_empty()).then_some(tag);
        self
    }

    /// Name used for tag derivation. Required in practice for closures,
    /// whose type carries no usable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.trim().is_empty()).then_some(name);
        self
    }

    /// Set what a failing judge does to the call.
    pub fn with_judge_failure_policy(mut self, policy: JudgeFailurePolicy) -> Self {
        self.judge_failure = policy;
        self
    }

    /// Set whether learning is awaited or spawned.
    pub fn with_learning_mode(mut self, mode: LearningMode) -> Self {
        self.learning = mode;
        self
    }

    /// Wrap an async function.
    pub fn wrap_async<F, Fut>(self, func: F) -> ExpCached<T>
    where
        F: Fn(CallArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ExpPoolError>> + Send + 'static,
    {
        let name = function_name::<F>();
        self.finish(name, Target::from_async(func))
    }

    /// Wrap a blocking function.
    pub fn wrap_sync<F>(self, func: F) -> ExpCached<T>
    where
        F: Fn(CallArgs) -> Result<T, ExpPoolError> + Send + Sync + 'static,
    {
        let name = function_name::<F>();
        self.finish(name, Target::from_sync(func))
    }

    fn finish(self, derived_name: Option<&'static str>, target: Target<T>) -> ExpCached<T> {
        if !self.enabled {
            return ExpCached {
                target,
                settings: None,
            };
        }

        let name = self
            .name
            .or_else(|| derived_name.map(str::to_string))
            .unwrap_or_else(|| "anonymous".to_string());
        let settings = CacheSettings {
            name,
            tag: self.tag,
            query_type: self.query_type,
            manager: self.manager,
            scorer: self.scorer,
            perfect_judge: self.perfect_judge,
            context_builder: self.context_builder,
            hooks: self.hooks,
            judge_failure: self.judge_failure,
            learning: self.learning,
        };
        ExpCached {
            target,
            settings: Some(Arc::new(settings)),
        }
    }
}

/// A function wrapped with the experience cache.
///
/// Cheap to clone. When the pool was disabled at wrap time this is a plain
/// pass-through: no `req` check, no lookups, no writes.
pub struct ExpCached<T> {
    target: Target<T>,
    settings: Option<Arc<CacheSettings<T>>>,
}

impl<T> Clone for ExpCached<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<T: Send + 'static> ExpCached<T> {
    pub fn is_caching(&self) -> bool {
        self.settings.is_some()
    }

    pub fn is_async(&self) -> bool {
        self.target.is_async()
    }

    /// Call from async code.
    pub async fn invoke(&self, args: CallArgs) -> Result<T, ExpPoolError> {
        match &self.settings {
            None => self.target.run(args).await,
            Some(settings) => {
                args.require_req()?;
                run_cached(settings.clone(), self.target.clone(), args).await
            }
        }
    }

    /// Call from sync code, blocking until the result is ready.
    ///
    /// Works with or without a surrounding tokio runtime; see [`adapter::block_on`].
    /// Inside a current-thread runtime the caller's thread is parked for the
    /// whole call, so the wrapped function must not wait on tasks of that
    /// runtime. Use [`invoke`](Self::invoke) there instead.
    pub fn call(&self, args: CallArgs) -> Result<T, ExpPoolError> {
        let settings = match (&self.settings, &self.target) {
            (None, Target::Sync(func)) => return func(args),
            (None, Target::Async(_)) => None,
            (Some(settings), _) => {
                args.require_req()?;
                Some(settings.clone())
            }
        };

        let target = self.target.clone();
        adapter::block_on(async move {
            match settings {
                None => target.run(args).await,
                Some(settings) => run_cached(settings, target, args).await,
            }
        })
    }
}
