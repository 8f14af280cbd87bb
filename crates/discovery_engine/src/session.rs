use std::sync::Arc;

use discovery_core::{update, Msg, OrchestratorState, ViewModel};
use discovery_logging::discovery_trace;
use tokio::sync::mpsc;

use crate::{ChannelMsgSink, EngineHandle, EngineSettings, JobClient, LegacyClient};

/// Owns the orchestrator state and feeds engine events back into `update`.
pub struct Session {
    state: OrchestratorState,
    engine: EngineHandle,
    events: mpsc::UnboundedReceiver<Msg>,
}

impl Session {
    pub fn new(
        client: Arc<dyn JobClient>,
        legacy: Arc<dyn LegacyClient>,
        settings: EngineSettings,
    ) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let engine = EngineHandle::new(client, legacy, settings, Arc::new(ChannelMsgSink::new(tx)));
        Self {
            state: OrchestratorState::new(),
            engine,
            events,
        }
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn view(&self) -> ViewModel {
        self.state.view()
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Applies one message and hands the resulting effects to the engine.
    /// Returns whether the visible state changed.
    pub fn dispatch(&mut self, msg: Msg) -> bool {
        discovery_trace!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let changed = state.consume_dirty();
        self.state = state;
        for effect in effects {
            self.engine.execute(effect);
        }
        changed
    }

    /// Waits for the next engine event and applies it.
    /// Returns `None` if the engine has gone away.
    pub async fn step(&mut self) -> Option<bool> {
        let msg = self.events.recv().await?;
        Some(self.dispatch(msg))
    }

    /// Processes engine events until the current run settles, calling `observe`
    /// whenever the visible state changes.
    pub async fn run_until_settled<F>(&mut self, mut observe: F) -> &OrchestratorState
    where
        F: FnMut(&OrchestratorState),
    {
        while self.state.phase().is_in_flight() {
            match self.step().await {
                Some(true) => observe(&self.state),
                Some(false) => {}
                None => break,
            }
        }
        &self.state
    }
}
