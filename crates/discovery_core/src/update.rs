use crate::{
    summary_text, Effect, Inputs, Job, JobStatus, Mode, ModeKind, Msg, OrchestratorState, Phase,
    PollKind, PollProfile, Query, ResultSet, ResultSnapshot, RunError, RunRequest, SimStage,
    Supplier, COMPLETE_PROGRESS, FETCHING_PROGRESS, SUBMITTING_PROGRESS,
};

const LEGACY_ACCEPTED_PROGRESS: u8 = 50;

/// Pure update function: applies a message to state and returns any effects.
///
/// Engine events carry the generation of the run that produced them; events from a
/// superseded run are dropped here, so late timers and responses cannot overwrite the
/// visible state.
pub fn update(state: OrchestratorState, msg: Msg) -> (OrchestratorState, Vec<Effect>) {
    if let Some(generation) = msg.generation() {
        if generation != state.generation {
            return (state, Vec::new());
        }
    }

    match msg {
        Msg::ComponentChanged(component) => edit_inputs(state, |inputs| Inputs {
            component,
            ..inputs
        }),
        Msg::CountryChanged(country) => edit_inputs(state, |inputs| Inputs { country, ..inputs }),
        Msg::DebugTaskIdChanged(debug_task_id) => edit_inputs(state, |inputs| Inputs {
            debug_task_id,
            ..inputs
        }),
        Msg::ModeSelected(mode) => edit_inputs(state, |inputs| Inputs { mode, ..inputs }),
        Msg::SubmitClicked => match state.inputs.resolve() {
            Ok(request) => start_run(state, request),
            Err(reason) => (
                OrchestratorState {
                    status_message: reason,
                    dirty: true,
                    ..state
                },
                Vec::new(),
            ),
        },
        Msg::RetryClicked => {
            if state.phase != Phase::Error {
                return (state, Vec::new());
            }
            match state.run.clone() {
                Some(request) => start_run(state, request),
                None => (state, Vec::new()),
            }
        }
        Msg::Dismissed => dismiss(state),
        Msg::ResultsRestored(snapshot) => restore(state, snapshot),
        Msg::JobSubmitted { job, .. } => on_job_submitted(state, job),
        Msg::SubmitFailed { error, .. } => {
            if state.phase != Phase::Submitting {
                return (state, Vec::new());
            }
            into_error(state, error)
        }
        Msg::LegacyQueryAccepted { .. } => on_legacy_accepted(state),
        Msg::PollTick {
            poll_count,
            job,
            progress,
            ..
        } => on_poll_tick(state, poll_count, job, progress),
        Msg::JobCompleted { job, .. } => on_job_completed(state, job),
        Msg::JobFailed { job, .. } => on_job_failed(state, job),
        Msg::PollFailed { error, .. } => {
            if state.phase != Phase::Polling {
                return (state, Vec::new());
            }
            into_error(state, error)
        }
        Msg::SimulationStep { stage, .. } => on_simulation_step(state, stage),
        Msg::ResultsFetched {
            suppliers, summary, ..
        } => on_results_fetched(state, suppliers, summary),
        Msg::FetchFailed { error, .. } => {
            if state.phase != Phase::FetchingResult {
                return (state, Vec::new());
            }
            into_error(state, error)
        }
    }
}

/// Input edits never abort a run; outside Idle they only hide the results.
fn edit_inputs(
    state: OrchestratorState,
    edit: impl FnOnce(Inputs) -> Inputs,
) -> (OrchestratorState, Vec<Effect>) {
    let results_ready = state.phase == Phase::Idle && state.results_ready;
    let next = OrchestratorState {
        inputs: edit(state.inputs),
        results_ready,
        dirty: true,
        ..state
    };
    (next, Vec::new())
}

/// Fresh state for a new run. The previous run, if still pending, is cancelled.
fn start_run(state: OrchestratorState, request: RunRequest) -> (OrchestratorState, Vec<Effect>) {
    let generation = state.generation + 1;
    let mut effects = Vec::with_capacity(2);
    if state.phase.is_in_flight() {
        effects.push(Effect::CancelRun {
            generation: state.generation,
        });
    }

    let query = request.query.clone();
    let (phase, status_message, progress, first_step) = match &request.mode {
        Mode::Normal => (
            Phase::Submitting,
            "Submitting search request...".to_string(),
            SUBMITTING_PROGRESS,
            Effect::SubmitJob { generation, query },
        ),
        Mode::Legacy => (
            Phase::Submitting,
            "Searching for suppliers...".to_string(),
            SUBMITTING_PROGRESS,
            Effect::RunLegacyQuery { generation, query },
        ),
        Mode::Debug { task_id } => (
            Phase::Polling,
            format!("Looking up task {task_id}..."),
            PollProfile::debug().base,
            Effect::PollJob {
                generation,
                job_id: task_id.clone(),
                kind: PollKind::Debug,
            },
        ),
        Mode::Mock => (
            Phase::Polling,
            "Submitting search request (mock)...".to_string(),
            SUBMITTING_PROGRESS,
            Effect::RunSimulation { generation, query },
        ),
    };
    effects.push(first_step);

    let next = OrchestratorState {
        phase,
        inputs: state.inputs,
        generation,
        run: Some(request),
        progress,
        status_message,
        dirty: true,
        ..OrchestratorState::default()
    };
    (next, effects)
}

fn dismiss(state: OrchestratorState) -> (OrchestratorState, Vec<Effect>) {
    let mut effects = Vec::new();
    if state.phase.is_in_flight() {
        effects.push(Effect::CancelRun {
            generation: state.generation,
        });
    }
    let next = OrchestratorState {
        inputs: state.inputs,
        generation: state.generation + 1,
        dirty: true,
        ..OrchestratorState::default()
    };
    (next, effects)
}

fn restore(state: OrchestratorState, snapshot: ResultSnapshot) -> (OrchestratorState, Vec<Effect>) {
    if state.phase.is_in_flight() {
        return (state, Vec::new());
    }
    let ResultSnapshot {
        mode,
        query,
        results,
    } = snapshot;
    let inputs = Inputs {
        component: query.component.clone(),
        country: query.country.clone(),
        mode: mode.kind(),
        debug_task_id: state.inputs.debug_task_id,
    };
    let next = OrchestratorState {
        phase: Phase::Completed,
        inputs,
        generation: state.generation + 1,
        run: Some(RunRequest { mode, query }),
        status_message: results.summary.clone(),
        results: Some(results),
        progress: COMPLETE_PROGRESS,
        results_ready: true,
        dirty: true,
        ..OrchestratorState::default()
    };
    (next, Vec::new())
}

fn into_error(state: OrchestratorState, error: RunError) -> (OrchestratorState, Vec<Effect>) {
    let next = OrchestratorState {
        phase: Phase::Error,
        status_message: error.to_string(),
        error: Some(error),
        dirty: true,
        ..state
    };
    (next, Vec::new())
}

fn run_mode(state: &OrchestratorState) -> Option<ModeKind> {
    state.run.as_ref().map(|run| run.mode.kind())
}

fn on_job_submitted(state: OrchestratorState, job: Job) -> (OrchestratorState, Vec<Effect>) {
    if state.phase != Phase::Submitting || run_mode(&state) != Some(ModeKind::Normal) {
        return (state, Vec::new());
    }
    let generation = state.generation;
    let job_id = job.id.clone();
    let next = OrchestratorState {
        phase: Phase::Polling,
        status_message: format!("Search queued as job {job_id}"),
        progress: state.progress.max(PollProfile::normal().base),
        job: Some(job),
        dirty: true,
        ..state
    };
    (
        next,
        vec![Effect::PollJob {
            generation,
            job_id,
            kind: PollKind::Normal,
        }],
    )
}

fn on_legacy_accepted(state: OrchestratorState) -> (OrchestratorState, Vec<Effect>) {
    if state.phase != Phase::Submitting || run_mode(&state) != Some(ModeKind::Legacy) {
        return (state, Vec::new());
    }
    let Some(query) = state.run.as_ref().map(|run| run.query.clone()) else {
        return (state, Vec::new());
    };
    let generation = state.generation;
    let next = OrchestratorState {
        phase: Phase::FetchingResult,
        status_message: "Loading results...".to_string(),
        progress: state.progress.max(LEGACY_ACCEPTED_PROGRESS),
        dirty: true,
        ..state
    };
    (next, vec![Effect::FetchLegacyResults { generation, query }])
}

fn is_polled_mode(state: &OrchestratorState) -> bool {
    matches!(
        run_mode(state),
        Some(ModeKind::Normal) | Some(ModeKind::Debug)
    )
}

fn poll_message(job: &Job) -> String {
    if let Some(message) = job.message() {
        return message.to_string();
    }
    match job.status {
        JobStatus::Queued => "Waiting in queue...".to_string(),
        JobStatus::Processing => "Searching for suppliers...".to_string(),
        JobStatus::Completed => "Search complete".to_string(),
        JobStatus::Failed => "Search failed".to_string(),
    }
}

fn on_poll_tick(
    state: OrchestratorState,
    poll_count: u32,
    job: Job,
    progress: u8,
) -> (OrchestratorState, Vec<Effect>) {
    if state.phase != Phase::Polling || !is_polled_mode(&state) {
        return (state, Vec::new());
    }
    let next = OrchestratorState {
        status_message: poll_message(&job),
        poll_count: state.poll_count.max(poll_count),
        progress: state.progress.max(progress),
        job: Some(job),
        dirty: true,
        ..state
    };
    (next, Vec::new())
}

fn on_job_completed(state: OrchestratorState, job: Job) -> (OrchestratorState, Vec<Effect>) {
    if state.phase != Phase::Polling || !is_polled_mode(&state) {
        return (state, Vec::new());
    }
    let generation = state.generation;
    let job_id = job.id.clone();

    // The server is authoritative for what a debug lookup originally queried.
    // Fields it leaves out keep whatever the user typed.
    let (run, inputs) = match state.run {
        Some(RunRequest {
            mode: mode @ Mode::Debug { .. },
            ..
        }) => {
            let query = Query::new(
                non_blank_or(&job.component, &state.inputs.component),
                non_blank_or(&job.country, &state.inputs.country),
            );
            if query.component.is_empty() || query.country.is_empty() {
                let state = OrchestratorState {
                    run: Some(RunRequest { mode, query }),
                    job: Some(job),
                    ..state
                };
                return into_error(
                    state,
                    RunError::MalformedResponse(format!(
                        "task {job_id} completed without its component and country"
                    )),
                );
            }
            let inputs = Inputs {
                component: query.component.clone(),
                country: query.country.clone(),
                ..state.inputs
            };
            (Some(RunRequest { mode, query }), inputs)
        }
        run => (run, state.inputs),
    };

    let next = OrchestratorState {
        phase: Phase::FetchingResult,
        inputs,
        run,
        status_message: "Search complete, fetching results...".to_string(),
        progress: state.progress.max(FETCHING_PROGRESS),
        job: Some(job),
        dirty: true,
        ..state
    };
    (next, vec![Effect::FetchResults { generation, job_id }])
}

fn non_blank_or(reported: &str, typed: &str) -> String {
    let reported = reported.trim();
    if reported.is_empty() {
        typed.trim().to_string()
    } else {
        reported.to_string()
    }
}

fn on_job_failed(state: OrchestratorState, job: Job) -> (OrchestratorState, Vec<Effect>) {
    if state.phase != Phase::Polling || !is_polled_mode(&state) {
        return (state, Vec::new());
    }
    let next = OrchestratorState {
        phase: Phase::Failed,
        status_message: job.message().unwrap_or("Search failed").to_string(),
        job: Some(job),
        dirty: true,
        ..state
    };
    (next, Vec::new())
}

fn on_simulation_step(
    state: OrchestratorState,
    stage: SimStage,
) -> (OrchestratorState, Vec<Effect>) {
    if run_mode(&state) != Some(ModeKind::Mock) {
        return (state, Vec::new());
    }
    let phase = match (state.phase, stage) {
        (Phase::Polling, SimStage::Fetching) => Phase::FetchingResult,
        (Phase::Polling, _) => Phase::Polling,
        _ => return (state, Vec::new()),
    };
    let next = OrchestratorState {
        phase,
        status_message: stage.message().to_string(),
        progress: state.progress.max(stage.progress()),
        dirty: true,
        ..state
    };
    (next, Vec::new())
}

fn on_results_fetched(
    state: OrchestratorState,
    suppliers: Vec<Supplier>,
    backend_summary: Option<String>,
) -> (OrchestratorState, Vec<Effect>) {
    if state.phase != Phase::FetchingResult {
        return (state, Vec::new());
    }
    let Some(run) = state.run.as_ref() else {
        return (state, Vec::new());
    };

    let computed = summary_text(suppliers.len(), &run.query, run.mode == Mode::Mock);
    let summary = match (&run.mode, backend_summary) {
        (Mode::Legacy, Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
        _ => computed,
    };

    let next = OrchestratorState {
        phase: Phase::Completed,
        status_message: summary.clone(),
        results: Some(ResultSet { suppliers, summary }),
        progress: COMPLETE_PROGRESS,
        results_ready: true,
        dirty: true,
        ..state
    };
    (next, Vec::new())
}
