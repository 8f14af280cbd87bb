use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use discovery_core::{Msg, OrchestratorState, Phase};
use discovery_engine::{ReqwestJobClient, Session};
use discovery_logging::{discovery_info, discovery_warn};

use crate::cli::SearchArgs;
use crate::config::AppConfig;
use crate::persistence::{load_last_result, save_last_result};
use crate::render::{report, status_line};

fn new_session(config: &AppConfig) -> Result<Session> {
    let client = Arc::new(
        ReqwestJobClient::new(config.client_settings())
            .with_context(|| format!("invalid backend url {:?}", config.base_url))?,
    );
    Ok(Session::new(client.clone(), client, config.engine_settings()))
}

pub async fn search(config: &AppConfig, args: SearchArgs) -> Result<ExitCode> {
    let mut session = new_session(config)?;
    session.dispatch(Msg::ModeSelected(args.mode));
    session.dispatch(Msg::ComponentChanged(args.component));
    session.dispatch(Msg::CountryChanged(args.country));
    session.dispatch(Msg::DebugTaskIdChanged(args.debug_task_id));
    session.dispatch(Msg::SubmitClicked);

    if session.state().phase() == Phase::Idle {
        // Rejected by input validation.
        eprintln!("{}", session.state().status_message());
        return Ok(ExitCode::from(2));
    }

    let mut retries_left = config.auto_retries;
    loop {
        session.run_until_settled(show_progress).await;
        if session.state().phase() != Phase::Error || retries_left == 0 {
            break;
        }
        retries_left -= 1;
        discovery_warn!(
            "Run ended with \"{}\", retrying ({} left)",
            session.state().status_message(),
            retries_left
        );
        eprintln!();
        session.dispatch(Msg::RetryClicked);
    }
    eprintln!();

    let state = session.state();
    print_report(state)?;
    if let Some(snapshot) = state.result_snapshot() {
        if let Some(path) = save_last_result(&config.state_dir, &snapshot) {
            discovery_info!("Saved result to {:?}", path);
        }
    }

    Ok(if state.phase() == Phase::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn last(config: &AppConfig) -> Result<ExitCode> {
    let Some(snapshot) = load_last_result(&config.state_dir) else {
        eprintln!("No saved result in {}", config.state_dir.display());
        return Ok(ExitCode::FAILURE);
    };
    let mut session = new_session(config)?;
    session.dispatch(Msg::ResultsRestored(snapshot));
    print_report(session.state())?;
    Ok(ExitCode::SUCCESS)
}

fn show_progress(state: &OrchestratorState) {
    let mut stderr = io::stderr().lock();
    let _ = write!(stderr, "\r{}\x1b[K", status_line(&state.view()));
    let _ = stderr.flush();
}

fn print_report(state: &OrchestratorState) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for line in report(&state.view()) {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}
