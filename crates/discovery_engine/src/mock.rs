use std::time::Duration;

use discovery_core::{Query, SimStage, Supplier};
use tokio_util::sync::CancellationToken;

/// Pauses of the simulated sequence: before queued, searching, fetching, and the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    pub step_delays: [Duration; 4],
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            step_delays: [
                Duration::from_millis(800),
                Duration::from_millis(1200),
                Duration::from_millis(800),
                Duration::from_millis(1000),
            ],
        }
    }
}

impl SimulationSettings {
    pub fn instant() -> Self {
        Self {
            step_delays: [Duration::ZERO; 4],
        }
    }
}

/// Canned result set returned by mock runs, tagged with the queried component and country.
pub fn mock_suppliers(query: &Query) -> Vec<Supplier> {
    let supplier = |name: &str, location: &str, website: &str, lead_time_days, min_order_qty| {
        Supplier {
            id: None,
            name: name.to_string(),
            website: Some(website.to_string()),
            location: Some(location.to_string()),
            product: Some(query.component.clone()),
            component_type: query.component.clone(),
            country: query.country.clone(),
            lead_time_days: Some(lead_time_days),
            min_order_qty: Some(min_order_qty),
            certifications: vec!["ISO 9001".to_string()],
            summary: Some(format!(
                "Mock supplier of {} based in {}.",
                query.component, query.country
            )),
            raw_ai_source: None,
            created_at: None,
        }
    };
    vec![
        supplier(
            "Acme Industrial Supply",
            "Springfield",
            "https://acme.example.com",
            14,
            100,
        ),
        supplier(
            "Globex Components",
            "Shelbyville",
            "https://globex.example.com",
            21,
            250,
        ),
    ]
}

/// Plays the mock sequence without any network I/O.
///
/// Returns the canned suppliers, or `None` when cancelled part way.
pub async fn run_simulation<F>(
    query: &Query,
    settings: &SimulationSettings,
    cancel: &CancellationToken,
    mut on_stage: F,
) -> Option<Vec<Supplier>>
where
    F: FnMut(SimStage) + Send,
{
    let [queued, searching, fetching, finish] = settings.step_delays;
    for (delay, stage) in [
        (queued, SimStage::Queued),
        (searching, SimStage::Searching),
        (fetching, SimStage::Fetching),
    ] {
        pause(delay, cancel).await?;
        on_stage(stage);
    }
    pause(finish, cancel).await?;
    Some(mock_suppliers(query))
}

async fn pause(delay: Duration, cancel: &CancellationToken) -> Option<()> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        _ = tokio::time::sleep(delay) => Some(()),
    }
}
