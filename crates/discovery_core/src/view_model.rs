use crate::{ModeKind, Phase, Supplier};

/// Everything a presenter needs; a plain copy detached from the state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewModel {
    pub phase: Phase,
    pub mode: ModeKind,
    pub component: String,
    pub country: String,
    pub debug_task_id: String,
    pub status_message: String,
    pub progress: u8,
    pub is_error: bool,
    pub can_retry: bool,
    pub job_id: Option<String>,
    pub poll_count: u32,
    pub summary: Option<String>,
    pub suppliers: Vec<SupplierRow>,
    pub results_ready: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierRow {
    pub name: String,
    pub location: Option<String>,
    pub website: Option<String>,
    pub product: Option<String>,
    pub lead_time_days: Option<u32>,
    pub min_order_qty: Option<u32>,
    pub certifications: String,
    pub summary: Option<String>,
}

impl From<&Supplier> for SupplierRow {
    fn from(supplier: &Supplier) -> Self {
        Self {
            name: supplier.name.clone(),
            location: supplier.location.clone(),
            website: supplier.website.clone(),
            product: supplier.product.clone(),
            lead_time_days: supplier.lead_time_days,
            min_order_qty: supplier.min_order_qty,
            certifications: supplier.certifications.join(", "),
            summary: supplier.summary.clone(),
        }
    }
}
