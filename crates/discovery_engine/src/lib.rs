//! Discovery engine: backend clients, poll loop, mock runs and effect execution.
mod client;
mod engine;
mod mock;
mod persist;
mod poll;
mod session;
mod types;

pub use client::{ClientSettings, JobClient, LegacyClient, LegacyResults, ReqwestJobClient};
pub use engine::{ChannelMsgSink, EngineHandle, EngineSettings, MsgSink};
pub use mock::{mock_suppliers, run_simulation, SimulationSettings};
pub use persist::{StateFileError, StateFiles};
pub use poll::{poll_until_terminal, PollOutcome};
pub use session::Session;
pub use types::{ClientError, FailureKind};
