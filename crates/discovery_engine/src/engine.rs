use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use discovery_core::{Effect, Generation, JobId, Msg, PollKind, PollProfile, Query, RunError};
use discovery_logging::{discovery_debug, discovery_info, discovery_warn, run_tag};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::mock::{run_simulation, SimulationSettings};
use crate::poll::{poll_until_terminal, PollOutcome};
use crate::{JobClient, LegacyClient};

/// Receives every engine event on its way back to the state machine.
pub trait MsgSink: Send + Sync {
    fn emit(&self, msg: Msg);
}

pub struct ChannelMsgSink {
    tx: mpsc::UnboundedSender<Msg>,
}

impl ChannelMsgSink {
    pub fn new(tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self { tx }
    }
}

impl MsgSink for ChannelMsgSink {
    fn emit(&self, msg: Msg) {
        let _ = self.tx.send(msg);
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub normal_poll: PollProfile,
    pub debug_poll: PollProfile,
    /// Upper bound on one poll loop; `None` polls until a terminal status.
    pub poll_deadline: Option<Duration>,
    pub simulation: SimulationSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            normal_poll: PollProfile::normal(),
            debug_poll: PollProfile::debug(),
            poll_deadline: Some(Duration::from_secs(10 * 60)),
            simulation: SimulationSettings::default(),
        }
    }
}

impl EngineSettings {
    fn profile(&self, kind: PollKind) -> &PollProfile {
        match kind {
            PollKind::Normal => &self.normal_poll,
            PollKind::Debug => &self.debug_poll,
        }
    }
}

#[derive(Clone)]
struct Shared {
    client: Arc<dyn JobClient>,
    legacy: Arc<dyn LegacyClient>,
    settings: Arc<EngineSettings>,
    sink: Arc<dyn MsgSink>,
}

/// Executes effects on the current tokio runtime, one task per effect.
///
/// Each run generation owns a cancellation token; `CancelRun` fires it so pending
/// requests and timers of a superseded run stop early.
pub struct EngineHandle {
    shared: Shared,
    runs: Arc<Mutex<HashMap<Generation, CancellationToken>>>,
}

impl EngineHandle {
    pub fn new(
        client: Arc<dyn JobClient>,
        legacy: Arc<dyn LegacyClient>,
        settings: EngineSettings,
        sink: Arc<dyn MsgSink>,
    ) -> Self {
        Self {
            shared: Shared {
                client,
                legacy,
                settings: Arc::new(settings),
                sink,
            },
            runs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn execute(&self, effect: Effect) {
        let generation = effect.generation();
        if let Effect::CancelRun { .. } = effect {
            self.cancel(generation);
            return;
        }

        let token = self.token_for(generation);
        let shared = self.shared.clone();
        let runs = self.runs.clone();
        tokio::spawn(async move {
            let settled = run_effect(&shared, effect, &token).await;
            if settled {
                if let Ok(mut runs) = runs.lock() {
                    runs.remove(&generation);
                }
            }
        });
    }

    /// Cancels every pending run.
    pub fn shutdown(&self) {
        if let Ok(mut runs) = self.runs.lock() {
            for (_, token) in runs.drain() {
                token.cancel();
            }
        }
    }

    /// Number of runs that still hold a cancellation token.
    pub fn pending_runs(&self) -> usize {
        self.runs.lock().map(|runs| runs.len()).unwrap_or(0)
    }

    fn cancel(&self, generation: Generation) {
        let token = self
            .runs
            .lock()
            .ok()
            .and_then(|mut runs| runs.remove(&generation));
        if let Some(token) = token {
            discovery_info!("{} cancelled", run_tag(generation));
            token.cancel();
        }
    }

    fn token_for(&self, generation: Generation) -> CancellationToken {
        match self.runs.lock() {
            Ok(mut runs) => runs.entry(generation).or_default().clone(),
            Err(_) => CancellationToken::new(),
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn unless_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        _ = token.cancelled() => None,
        output = fut => Some(output),
    }
}

/// Runs one effect to completion. Returns true once the run has nothing left pending.
async fn run_effect(shared: &Shared, effect: Effect, token: &CancellationToken) -> bool {
    let generation = effect.generation();
    let tag = run_tag(generation);
    let msg = match effect {
        Effect::SubmitJob { query, .. } => {
            discovery_info!("{} submitting {}/{}", tag, query.component, query.country);
            match unless_cancelled(token, shared.client.submit(&query)).await {
                Some(Ok(job)) => {
                    discovery_info!("{} accepted as job {}", tag, job.id);
                    Msg::JobSubmitted { generation, job }
                }
                Some(Err(err)) => {
                    discovery_warn!("{} submit failed: {}", tag, err);
                    Msg::SubmitFailed {
                        generation,
                        error: err.into(),
                    }
                }
                None => return true,
            }
        }
        Effect::PollJob { job_id, kind, .. } => {
            match poll(shared, generation, &job_id, kind, token).await {
                Some(msg) => msg,
                None => return true,
            }
        }
        Effect::FetchResults { job_id, .. } => {
            match unless_cancelled(token, shared.client.fetch_results(&job_id)).await {
                Some(Ok(suppliers)) => {
                    discovery_info!("{} fetched {} suppliers", tag, suppliers.len());
                    Msg::ResultsFetched {
                        generation,
                        suppliers,
                        summary: None,
                    }
                }
                Some(Err(err)) => {
                    discovery_warn!("{} fetching results failed: {}", tag, err);
                    Msg::FetchFailed {
                        generation,
                        error: err.into(),
                    }
                }
                None => return true,
            }
        }
        Effect::RunSimulation { query, .. } => {
            simulate(shared, generation, &query, token).await;
            return true;
        }
        Effect::RunLegacyQuery { query, .. } => {
            discovery_info!("{} legacy query {}/{}", tag, query.component, query.country);
            match unless_cancelled(token, shared.legacy.legacy_query(&query)).await {
                Some(Ok(())) => Msg::LegacyQueryAccepted { generation },
                Some(Err(err)) => {
                    discovery_warn!("{} legacy query failed: {}", tag, err);
                    Msg::SubmitFailed {
                        generation,
                        error: err.into(),
                    }
                }
                None => return true,
            }
        }
        Effect::FetchLegacyResults { query, .. } => {
            match unless_cancelled(token, shared.legacy.legacy_results(&query)).await {
                Some(Ok(results)) => {
                    discovery_info!("{} legacy results: {} suppliers", tag, results.suppliers.len());
                    Msg::ResultsFetched {
                        generation,
                        suppliers: results.suppliers,
                        summary: results.summary,
                    }
                }
                Some(Err(err)) => {
                    discovery_warn!("{} legacy results failed: {}", tag, err);
                    Msg::FetchFailed {
                        generation,
                        error: err.into(),
                    }
                }
                None => return true,
            }
        }
        Effect::CancelRun { .. } => return true,
    };

    let settled = !matches!(
        msg,
        Msg::JobSubmitted { .. } | Msg::JobCompleted { .. } | Msg::LegacyQueryAccepted { .. }
    );
    if token.is_cancelled() {
        discovery_debug!("{} dropped a late event", tag);
        return true;
    }
    shared.sink.emit(msg);
    settled
}

async fn poll(
    shared: &Shared,
    generation: Generation,
    job_id: &JobId,
    kind: PollKind,
    token: &CancellationToken,
) -> Option<Msg> {
    let tag = run_tag(generation);
    let profile = shared.settings.profile(kind);
    let sink = shared.sink.clone();
    discovery_info!("{} polling job {} ({:?})", tag, job_id, kind);

    let outcome = poll_until_terminal(
        shared.client.as_ref(),
        job_id,
        profile,
        shared.settings.poll_deadline,
        token,
        |poll_count, job, progress| {
            sink.emit(Msg::PollTick {
                generation,
                poll_count,
                job: job.clone(),
                progress,
            });
        },
    )
    .await;

    match outcome {
        Ok(PollOutcome::Completed(job)) => {
            discovery_info!("{} job {} completed", tag, job.id);
            Some(Msg::JobCompleted { generation, job })
        }
        Ok(PollOutcome::Failed(job)) => {
            discovery_warn!("{} job {} failed: {:?}", tag, job.id, job.message());
            Some(Msg::JobFailed { generation, job })
        }
        Ok(PollOutcome::TimedOut { polls }) => {
            discovery_warn!("{} gave up on job {} after {} polls", tag, job_id, polls);
            Some(Msg::PollFailed {
                generation,
                error: RunError::Timeout { polls },
            })
        }
        Ok(PollOutcome::Cancelled) => None,
        Err(err) => {
            discovery_warn!("{} polling job {} failed: {}", tag, job_id, err);
            Some(Msg::PollFailed {
                generation,
                error: err.into(),
            })
        }
    }
}

async fn simulate(shared: &Shared, generation: Generation, query: &Query, token: &CancellationToken) {
    discovery_info!("{} mock run for {}/{}", run_tag(generation), query.component, query.country);
    let sink = shared.sink.clone();
    let suppliers = run_simulation(query, &shared.settings.simulation, token, |stage| {
        sink.emit(Msg::SimulationStep { generation, stage });
    })
    .await;
    if let Some(suppliers) = suppliers {
        if !token.is_cancelled() {
            shared.sink.emit(Msg::ResultsFetched {
                generation,
                suppliers,
                summary: None,
            });
        }
    }
}
