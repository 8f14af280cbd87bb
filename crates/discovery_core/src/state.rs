use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::view_model::{SupplierRow, ViewModel};
use crate::{Job, JobId, Supplier};

/// Run token. Every engine event carries the generation of the run that produced it.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    FetchingResult,
    Completed,
    Failed,
    Error,
}

impl Phase {
    /// Nothing is pending; the state only changes on user input.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            Phase::Idle | Phase::Completed | Phase::Failed | Phase::Error
        )
    }

    pub fn is_in_flight(self) -> bool {
        !self.is_settled()
    }
}

/// The mode toggle as the user sees it, before a run is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModeKind {
    #[default]
    Normal,
    Debug,
    Mock,
    Legacy,
}

/// Execution path of one run, fixed when the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Normal,
    Debug {
        task_id: JobId,
    },
    Mock,
    Legacy,
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Normal => ModeKind::Normal,
            Mode::Debug { .. } => ModeKind::Debug,
            Mode::Mock => ModeKind::Mock,
            Mode::Legacy => ModeKind::Legacy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    pub component: String,
    pub country: String,
}

impl Query {
    pub fn new(component: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            component: component.into().trim().to_string(),
            country: country.into().trim().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.component.is_empty() && !self.country.is_empty()
    }
}

/// Suppliers and their summary line; one cannot exist without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub suppliers: Vec<Supplier>,
    pub summary: String,
}

/// A completed result that can be written to disk and restored later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub mode: Mode,
    pub query: Query,
    pub results: ResultSet,
}

/// Everything needed to replay a run from the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub mode: Mode,
    pub query: Query,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response from server: {0}")]
    MalformedResponse(String),
    #[error("search did not finish after {polls} status checks")]
    Timeout { polls: u32 },
}

/// Form fields as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inputs {
    pub component: String,
    pub country: String,
    pub mode: ModeKind,
    pub debug_task_id: String,
}

impl Inputs {
    /// Turns the form into a run request, or explains what is missing.
    pub fn resolve(&self) -> Result<RunRequest, String> {
        let query = Query::new(self.component.as_str(), self.country.as_str());
        let mode = match self.mode {
            ModeKind::Normal => Mode::Normal,
            ModeKind::Mock => Mode::Mock,
            ModeKind::Legacy => Mode::Legacy,
            ModeKind::Debug => {
                let task_id = self.debug_task_id.trim();
                if task_id.is_empty() {
                    return Err("Enter a task id to look up".to_string());
                }
                // Debug runs take their query from the server snapshot.
                return Ok(RunRequest {
                    mode: Mode::Debug {
                        task_id: JobId::new(task_id),
                    },
                    query,
                });
            }
        };
        if !query.is_complete() {
            return Err("Enter both a component and a country".to_string());
        }
        Ok(RunRequest { mode, query })
    }
}

/// The only mutable entity of the orchestrator. `update` consumes one value and
/// returns its replacement; nothing mutates a state in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrchestratorState {
    pub(crate) phase: Phase,
    pub(crate) inputs: Inputs,
    pub(crate) generation: Generation,
    pub(crate) run: Option<RunRequest>,
    pub(crate) job: Option<Job>,
    pub(crate) results: Option<ResultSet>,
    pub(crate) progress: u8,
    pub(crate) status_message: String,
    pub(crate) poll_count: u32,
    pub(crate) error: Option<RunError>,
    pub(crate) results_ready: bool,
    pub(crate) dirty: bool,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn run(&self) -> Option<&RunRequest> {
        self.run.as_ref()
    }

    /// Mode of the current run, or the selected toggle when nothing has run yet.
    pub fn mode(&self) -> ModeKind {
        self.run
            .as_ref()
            .map(|run| run.mode.kind())
            .unwrap_or(self.inputs.mode)
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn suppliers(&self) -> &[Supplier] {
        self.results
            .as_ref()
            .map(|results| results.suppliers.as_slice())
            .unwrap_or(&[])
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.results.as_ref().map(|results| results.summary.as_str())
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn poll_count(&self) -> u32 {
        self.poll_count
    }

    pub fn error(&self) -> Option<&RunError> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        matches!(self.phase, Phase::Error | Phase::Failed)
    }

    pub fn results_ready(&self) -> bool {
        self.results_ready
    }

    /// Snapshot suitable for persisting, present only after a completed run.
    pub fn result_snapshot(&self) -> Option<ResultSnapshot> {
        if self.phase != Phase::Completed {
            return None;
        }
        let run = self.run.as_ref()?;
        let results = self.results.clone()?;
        Some(ResultSnapshot {
            mode: run.mode.clone(),
            query: run.query.clone(),
            results,
        })
    }

    /// Returns whether the state changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> ViewModel {
        ViewModel {
            phase: self.phase,
            mode: self.mode(),
            component: self.inputs.component.clone(),
            country: self.inputs.country.clone(),
            debug_task_id: self.inputs.debug_task_id.clone(),
            status_message: self.status_message.clone(),
            progress: self.progress,
            is_error: self.is_error(),
            can_retry: self.phase == Phase::Error && self.run.is_some(),
            job_id: self.job.as_ref().map(|job| job.id.to_string()),
            poll_count: self.poll_count,
            summary: self.summary_text().map(ToOwned::to_owned),
            suppliers: self.suppliers().iter().map(SupplierRow::from).collect(),
            results_ready: self.results_ready,
            dirty: self.dirty,
        }
    }
}
