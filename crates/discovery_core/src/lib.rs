//! Discovery core: pure orchestration state machine and view-model helpers.
mod effect;
mod model;
mod msg;
mod progress;
mod state;
mod summary;
mod update;
mod view_model;

pub use effect::Effect;
pub use model::{Job, JobId, JobStatus, Supplier};
pub use msg::{Msg, SimStage};
pub use progress::{
    PollKind, PollProfile, COMPLETE_PROGRESS, FETCHING_PROGRESS, SUBMITTING_PROGRESS,
};
pub use state::{
    Generation, Inputs, Mode, ModeKind, OrchestratorState, Phase, Query, ResultSet,
    ResultSnapshot, RunError, RunRequest,
};
pub use summary::summary_text;
pub use update::update;
pub use view_model::{SupplierRow, ViewModel};
