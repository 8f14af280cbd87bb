use crate::{Generation, Job, ModeKind, ResultSnapshot, RunError, Supplier};

/// Steps of the simulated (mock) sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStage {
    Queued,
    Searching,
    Fetching,
}

impl SimStage {
    pub fn message(self) -> &'static str {
        match self {
            SimStage::Queued => "Search queued (mock)...",
            SimStage::Searching => "Searching for suppliers (mock)...",
            SimStage::Fetching => "Fetching results (mock)...",
        }
    }

    pub fn progress(self) -> u8 {
        match self {
            SimStage::Queued => 25,
            SimStage::Searching => 55,
            SimStage::Fetching => crate::FETCHING_PROGRESS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the component field.
    ComponentChanged(String),
    /// User edited the country field.
    CountryChanged(String),
    /// User edited the task id used by debug lookups.
    DebugTaskIdChanged(String),
    /// User flipped the mode toggle.
    ModeSelected(ModeKind),
    /// User asked for a new search with the current inputs.
    SubmitClicked,
    /// User asked to replay the run that ended in an error.
    RetryClicked,
    /// User navigated away; the visible run is abandoned.
    Dismissed,
    /// A previously persisted result set is shown again.
    ResultsRestored(ResultSnapshot),
    /// Engine: the backend accepted the submission.
    JobSubmitted { generation: Generation, job: Job },
    /// Engine: the submission (or the legacy query) did not go through.
    SubmitFailed {
        generation: Generation,
        error: RunError,
    },
    /// Engine: the legacy synchronous query returned successfully.
    LegacyQueryAccepted { generation: Generation },
    /// Engine: one non-terminal status check.
    PollTick {
        generation: Generation,
        poll_count: u32,
        job: Job,
        progress: u8,
    },
    /// Engine: the job reached `completed`.
    JobCompleted { generation: Generation, job: Job },
    /// Engine: the job reached `failed`.
    JobFailed { generation: Generation, job: Job },
    /// Engine: polling gave up (transport error or deadline).
    PollFailed {
        generation: Generation,
        error: RunError,
    },
    /// Engine: the simulated sequence advanced.
    SimulationStep {
        generation: Generation,
        stage: SimStage,
    },
    /// Engine: the result set arrived. `summary` is only set by the legacy contract.
    ResultsFetched {
        generation: Generation,
        suppliers: Vec<Supplier>,
        summary: Option<String>,
    },
    /// Engine: fetching results failed.
    FetchFailed {
        generation: Generation,
        error: RunError,
    },
}

impl Msg {
    /// Generation of the run an engine event belongs to; `None` for user intents.
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Msg::JobSubmitted { generation, .. }
            | Msg::SubmitFailed { generation, .. }
            | Msg::LegacyQueryAccepted { generation }
            | Msg::PollTick { generation, .. }
            | Msg::JobCompleted { generation, .. }
            | Msg::JobFailed { generation, .. }
            | Msg::PollFailed { generation, .. }
            | Msg::SimulationStep { generation, .. }
            | Msg::ResultsFetched { generation, .. }
            | Msg::FetchFailed { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}
