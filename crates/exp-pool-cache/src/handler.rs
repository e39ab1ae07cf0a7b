use std::sync::Arc;
use std::time::Instant;

use exp_pool_core::{
    CallArgs, ContextBuilder, ExpPoolError, Experience, ExperienceManager, Metric, PerfectJudge,
    QueryType, Scorer,
};

use crate::adapter::Target;
use crate::cache::{JudgeFailurePolicy, LearningMode};
use crate::hooks::SerdeHooks;
use crate::side_effect::BestEffort;

/// Everything fixed when a function is wrapped.
pub(crate) struct CacheSettings<T> {
    pub name: String,
    pub tag: Option<String>,
    pub query_type: QueryType,
    pub manager: Arc<dyn ExperienceManager>,
    pub scorer: Arc<dyn Scorer>,
    pub perfect_judge: Arc<dyn PerfectJudge>,
    pub context_builder: Arc<dyn ContextBuilder>,
    pub hooks: SerdeHooks<T>,
    pub judge_failure: JudgeFailurePolicy,
    pub learning: LearningMode,
}

impl<T> CacheSettings<T> {
    /// `Type.method` for method calls, the bare function name otherwise.
    fn derive_tag(&self, args: &CallArgs) -> String {
        if let Some(tag) = &self.tag {
            return tag.clone();
        }
        match &args.receiver {
            Some(receiver) => format!("{receiver}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Where a single call is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
    Start,
    Queried,
    JudgedPerfect,
    Executing,
    Serialized,
}

/// State of one invocation. Owned by that invocation only.
struct CallContext<T> {
    settings: Arc<CacheSettings<T>>,
    args: CallArgs,
    tag: String,
    req: String,
    exps: Vec<Experience>,
    time_cost: f64,
    state: CallState,
}

impl<T: Send + 'static> CallContext<T> {
    fn new(settings: Arc<CacheSettings<T>>, args: CallArgs) -> Result<Self, ExpPoolError> {
        let req = (settings.hooks.req_serialize)(args.require_req()?)?;
        let tag = settings.derive_tag(&args);
        Ok(Self {
            settings,
            args,
            tag,
            req,
            exps: Vec::new(),
            time_cost: 0.0,
            state: CallState::Start,
        })
    }

    fn advance(&mut self, next: CallState) {
        tracing::trace!(tag = %self.tag, from = ?self.state, to = ?next, "exp cache state");
        self.state = next;
    }

    async fn fetch_experiences(&mut self) -> Result<(), ExpPoolError> {
        self.exps = self
            .settings
            .manager
            .query(&self.req, self.settings.query_type, &self.tag)
            .await?;
        tracing::debug!(tag = %self.tag, count = self.exps.len(), "fetched experiences");
        self.advance(CallState::Queried);
        Ok(())
    }

    /// The stored response of the first experience the judge accepts.
    async fn get_one_perfect_exp(&mut self) -> Result<Option<T>, ExpPoolError> {
        let judge = &self.settings.perfect_judge;
        let mut accepted = None;
        for exp in &self.exps {
            let perfect = match judge.is_perfect(exp, &self.req, &self.args).await {
                Ok(perfect) => perfect,
                Err(e) => match self.settings.judge_failure {
                    JudgeFailurePolicy::Propagate => return Err(e),
                    JudgeFailurePolicy::TreatAsImperfect => {
                        tracing::warn!(tag = %self.tag, uuid = %exp.uuid(), error = %e, "judge failed, treating experience as imperfect");
                        false
                    }
                },
            };
            if perfect {
                let preview: String = exp.req().chars().take(20).collect();
                tracing::info!(tag = %self.tag, "got one perfect experience: {preview}...");
                accepted = Some(exp.resp().to_string());
                break;
            }
        }

        match accepted {
            Some(stored) => {
                self.advance(CallState::JudgedPerfect);
                (self.settings.hooks.resp_deserialize)(&stored).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Build the augmented request and run the target with it.
    async fn execute_function(&mut self, target: &Target<T>) -> Result<T, ExpPoolError> {
        let augmented = self
            .settings
            .context_builder
            .build(&self.exps, &self.args)
            .await?;
        let mut call_args = self.args.clone();
        call_args.replace_req(augmented);

        self.advance(CallState::Executing);
        let started = Instant::now();
        let raw = target.run(call_args).await?;
        self.time_cost = started.elapsed().as_secs_f64() * 1000.0;
        Ok(raw)
    }

    fn serialize_response(&mut self, raw: &T) -> Result<String, ExpPoolError> {
        let resp = (self.settings.hooks.resp_serialize)(raw);
        self.advance(CallState::Serialized);
        resp
    }

    /// Score and store the new experience off the critical path.
    ///
    /// A failed serialization is handed in as-is and absorbed with the rest.
    async fn process_experience(&mut self, resp: Result<String, ExpPoolError>) {
        let learn = learn(
            self.settings.scorer.clone(),
            self.settings.manager.clone(),
            self.req.clone(),
            resp,
            self.tag.clone(),
            self.time_cost,
        );
        let effect = BestEffort::new("exp_pool.learn", learn);
        match self.settings.learning {
            LearningMode::Inline => {
                effect.run().await;
            }
            LearningMode::Background => {
                effect.spawn();
            }
        }
    }
}

async fn learn(
    scorer: Arc<dyn Scorer>,
    manager: Arc<dyn ExperienceManager>,
    req: String,
    resp: Result<String, ExpPoolError>,
    tag: String,
    time_cost: f64,
) -> Result<(), ExpPoolError> {
    let resp = resp?;
    let score = scorer.evaluate(&req, &resp).await?;
    let exp = Experience::new(req, resp, tag)?
        .with_metric(Metric::with_score(score).with_time_cost(time_cost));
    manager.create(exp).await?;
    tracing::debug!("experience recorded");
    Ok(())
}

/// One full retrieve, judge, execute, learn cycle.
pub(crate) async fn run_cached<T: Send + 'static>(
    settings: Arc<CacheSettings<T>>,
    target: Target<T>,
    args: CallArgs,
) -> Result<T, ExpPoolError> {
    let mut ctx = CallContext::new(settings, args)?;

    ctx.fetch_experiences().await?;
    if let Some(resp) = ctx.get_one_perfect_exp().await? {
        return Ok(resp);
    }

    let raw = ctx.execute_function(&target).await?;
    let resp = ctx.serialize_response(&raw);
    ctx.process_experience(resp).await;
    Ok(raw)
}
