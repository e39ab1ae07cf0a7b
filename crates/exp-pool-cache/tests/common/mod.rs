#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use exp_pool_core::{
    CallArgs, ExpPoolError, Experience, ExperienceManager, PerfectJudge, QueryType, Score, Scorer,
};

/// Manager that serves a fixed candidate list and records everything it is asked.
#[derive(Default)]
pub struct RecordingManager {
    pub candidates: Vec<Experience>,
    pub fail_query: bool,
    pub fail_create: bool,
    pub queries: Mutex<Vec<(String, QueryType, String)>>,
    pub created: Mutex<Vec<Experience>>,
}

impl RecordingManager {
    pub fn with_candidates(candidates: Vec<Experience>) -> Self {
        Self {
            candidates,
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<Experience> {
        self.created.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(String, QueryType, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExperienceManager for RecordingManager {
    async fn query(
        &self,
        req: &str,
        query_type: QueryType,
        tag: &str,
    ) -> Result<Vec<Experience>, ExpPoolError> {
        self.queries
            .lock()
            .unwrap()
            .push((req.to_string(), query_type, tag.to_string()));
        if self.fail_query {
            return Err(ExpPoolError::Retrieval("index offline".to_string()));
        }
        Ok(self.candidates.clone())
    }

    async fn create(&self, exp: Experience) -> Result<(), ExpPoolError> {
        if self.fail_create {
            return Err(ExpPoolError::Storage("write rejected".to_string()));
        }
        self.created.lock().unwrap().push(exp);
        Ok(())
    }
}

/// Judge that accepts experiences with a given response and records what it saw.
pub struct RespJudge {
    pub accept_resp: String,
    pub fail_on: Option<String>,
    pub inspected: Mutex<Vec<String>>,
}

impl RespJudge {
    pub fn accepting(resp: &str) -> Self {
        Self {
            accept_resp: resp.to_string(),
            fail_on: None,
            inspected: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, resp: &str) -> Self {
        self.fail_on = Some(resp.to_string());
        self
    }

    pub fn inspected(&self) -> Vec<String> {
        self.inspected.lock().unwrap().clone()
    }
}

#[async_trait]
impl PerfectJudge for RespJudge {
    async fn is_perfect(
        &self,
        exp: &Experience,
        _serialized_req: &str,
        _args: &CallArgs,
    ) -> Result<bool, ExpPoolError> {
        self.inspected.lock().unwrap().push(exp.resp().to_string());
        if self.fail_on.as_deref() == Some(exp.resp()) {
            return Err(ExpPoolError::Judge("judge model timed out".to_string()));
        }
        Ok(exp.resp() == self.accept_resp)
    }
}

pub struct FailingScorer;

#[async_trait]
impl Scorer for FailingScorer {
    async fn evaluate(&self, _req: &str, _resp: &str) -> Result<Score, ExpPoolError> {
        Err(ExpPoolError::Scoring("RuntimeError".to_string()))
    }
}

pub struct PanickingScorer;

#[async_trait]
impl Scorer for PanickingScorer {
    async fn evaluate(&self, _req: &str, _resp: &str) -> Result<Score, ExpPoolError> {
        panic!("scorer crashed");
    }
}

pub struct FixedScorer(pub i64);

#[async_trait]
impl Scorer for FixedScorer {
    async fn evaluate(&self, _req: &str, _resp: &str) -> Result<Score, ExpPoolError> {
        Ok(Score::new(self.0, "fixed"))
    }
}

pub fn exp(req: &str, resp: &str, tag: &str) -> Experience {
    Experience::new(req, resp, tag).unwrap()
}

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
