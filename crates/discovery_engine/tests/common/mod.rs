#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use std::time::Duration;

use discovery_core::{Job, JobId, JobStatus, PollProfile, Query, Supplier};
use discovery_engine::{
    ClientError, EngineSettings, FailureKind, JobClient, LegacyClient, LegacyResults,
    SimulationSettings,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(discovery_logging::initialize_for_tests);
}

pub fn fast_profile(max_consecutive_errors: u32) -> PollProfile {
    PollProfile {
        interval: Duration::from_millis(5),
        max_consecutive_errors,
        ..PollProfile::normal()
    }
}

pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        normal_poll: fast_profile(3),
        debug_poll: PollProfile {
            interval: Duration::from_millis(5),
            ..PollProfile::debug()
        },
        poll_deadline: Some(Duration::from_secs(5)),
        simulation: SimulationSettings {
            step_delays: [Duration::from_millis(5); 4],
        },
    }
}

pub fn job(id: &str, status: JobStatus, component: &str, country: &str) -> Job {
    Job {
        status,
        ..Job::queued(JobId::new(id), component, country)
    }
}

pub fn supplier(name: &str) -> Supplier {
    Supplier {
        id: None,
        name: name.to_string(),
        website: None,
        location: None,
        product: None,
        component_type: String::new(),
        country: String::new(),
        lead_time_days: None,
        min_order_qty: None,
        certifications: Vec::new(),
        summary: None,
        raw_ai_source: None,
        created_at: None,
    }
}

pub fn network_error(message: &str) -> ClientError {
    ClientError {
        kind: FailureKind::Network,
        message: message.to_string(),
    }
}

/// In-memory backend that replays scripted responses in order.
///
/// When the poll script runs dry, `idle_status` is returned forever.
#[derive(Default)]
pub struct ScriptedClient {
    pub submits: Mutex<VecDeque<Result<Job, ClientError>>>,
    pub polls: Mutex<VecDeque<Result<Job, ClientError>>>,
    pub idle_status: Mutex<Option<Job>>,
    pub poll_delay: Mutex<Option<Duration>>,
    pub results: Mutex<VecDeque<Result<Vec<Supplier>, ClientError>>>,
    pub legacy_queries: Mutex<VecDeque<Result<(), ClientError>>>,
    pub legacy_results: Mutex<VecDeque<Result<LegacyResults, ClientError>>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn with_submits(self, items: Vec<Result<Job, ClientError>>) -> Self {
        self.submits.lock().unwrap().extend(items);
        self
    }

    pub fn with_polls(self, items: Vec<Result<Job, ClientError>>) -> Self {
        self.polls.lock().unwrap().extend(items);
        self
    }

    pub fn with_idle_status(self, job: Job) -> Self {
        *self.idle_status.lock().unwrap() = Some(job);
        self
    }

    /// Every status check takes `delay` before answering.
    pub fn with_poll_delay(self, delay: Duration) -> Self {
        *self.poll_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn with_results(self, items: Vec<Result<Vec<Supplier>, ClientError>>) -> Self {
        self.results.lock().unwrap().extend(items);
        self
    }

    pub fn with_legacy(
        self,
        queries: Vec<Result<(), ClientError>>,
        results: Vec<Result<LegacyResults, ClientError>>,
    ) -> Self {
        self.legacy_queries.lock().unwrap().extend(queries);
        self.legacy_results.lock().unwrap().extend(results);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn exhausted(what: &str) -> ClientError {
    ClientError {
        kind: FailureKind::Network,
        message: format!("no scripted {what} left"),
    }
}

#[async_trait::async_trait]
impl JobClient for ScriptedClient {
    async fn submit(&self, query: &Query) -> Result<Job, ClientError> {
        self.record(format!("submit {}/{}", query.component, query.country));
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("submit")))
    }

    async fn poll_status(&self, job_id: &JobId) -> Result<Job, ClientError> {
        self.record(format!("poll {job_id}"));
        let delay = *self.poll_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(next) = self.polls.lock().unwrap().pop_front() {
            return next;
        }
        self.idle_status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| exhausted("poll"))
    }

    async fn fetch_results(&self, job_id: &JobId) -> Result<Vec<Supplier>, ClientError> {
        self.record(format!("results {job_id}"));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("results")))
    }
}

#[async_trait::async_trait]
impl LegacyClient for ScriptedClient {
    async fn legacy_query(&self, query: &Query) -> Result<(), ClientError> {
        self.record(format!("legacy query {}/{}", query.component, query.country));
        self.legacy_queries
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("legacy query")))
    }

    async fn legacy_results(&self, query: &Query) -> Result<LegacyResults, ClientError> {
        self.record(format!("legacy results {}/{}", query.component, query.country));
        self.legacy_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("legacy results")))
    }
}
