use crate::{Generation, JobId, PollKind, Query};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob {
        generation: Generation,
        query: Query,
    },
    PollJob {
        generation: Generation,
        job_id: JobId,
        kind: PollKind,
    },
    FetchResults {
        generation: Generation,
        job_id: JobId,
    },
    RunSimulation {
        generation: Generation,
        query: Query,
    },
    RunLegacyQuery {
        generation: Generation,
        query: Query,
    },
    FetchLegacyResults {
        generation: Generation,
        query: Query,
    },
    /// Stop whatever the engine still has pending for a superseded run.
    CancelRun { generation: Generation },
}

impl Effect {
    pub fn generation(&self) -> Generation {
        match self {
            Effect::SubmitJob { generation, .. }
            | Effect::PollJob { generation, .. }
            | Effect::FetchResults { generation, .. }
            | Effect::RunSimulation { generation, .. }
            | Effect::RunLegacyQuery { generation, .. }
            | Effect::FetchLegacyResults { generation, .. }
            | Effect::CancelRun { generation } => *generation,
        }
    }
}
