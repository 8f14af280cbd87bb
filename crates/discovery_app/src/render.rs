use discovery_core::{ModeKind, Phase, SupplierRow, ViewModel};

const BAR_WIDTH: usize = 30;

/// One-line status shown while a run is in flight.
pub fn status_line(view: &ViewModel) -> String {
    let filled = usize::from(view.progress.min(100)) * BAR_WIDTH / 100;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
    let job = view
        .job_id
        .as_deref()
        .map(|id| format!(" [job {id}]"))
        .unwrap_or_default();
    format!("[{bar}] {:>3}% {}{job}", view.progress, view.status_message)
}

/// Final report for a settled run.
pub fn report(view: &ViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    match view.phase {
        Phase::Completed => {
            if let Some(summary) = view.summary.as_deref() {
                lines.push(summary.to_string());
            }
            for (index, row) in view.suppliers.iter().enumerate() {
                lines.extend(supplier_lines(index + 1, row));
            }
        }
        Phase::Failed => lines.push(format!("Search failed: {}", view.status_message)),
        Phase::Error => {
            lines.push(format!("Error: {}", view.status_message));
            if view.mode == ModeKind::Debug {
                lines.push(format!("Task id: {}", view.debug_task_id));
            }
        }
        Phase::Idle | Phase::Submitting | Phase::Polling | Phase::FetchingResult => {
            lines.push(status_line(view));
        }
    }
    lines
}

fn supplier_lines(position: usize, row: &SupplierRow) -> Vec<String> {
    let mut lines = vec![format!("{position:>2}. {}", row.name)];
    let mut detail = |label: &str, value: Option<String>| {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            lines.push(format!("    {label}: {value}"));
        }
    };
    detail("location", row.location.clone());
    detail("website", row.website.clone());
    detail("product", row.product.clone());
    detail("lead time", row.lead_time_days.map(|days| format!("{days} days")));
    detail("min order", row.min_order_qty.map(|qty| qty.to_string()));
    detail("certifications", Some(row.certifications.clone()));
    detail("summary", row.summary.clone());
    lines
}
