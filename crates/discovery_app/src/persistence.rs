use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use discovery_core::{Mode, Query, ResultSet, ResultSnapshot, Supplier};
use discovery_engine::StateFiles;
use discovery_logging::{discovery_error, discovery_info, discovery_warn};
use serde::{Deserialize, Serialize};

pub const LAST_RESULT_FILENAME: &str = ".discovery_last_result.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSupplier {
    id: Option<String>,
    name: String,
    website: Option<String>,
    location: Option<String>,
    product: Option<String>,
    component_type: String,
    country: String,
    lead_time_days: Option<u32>,
    min_order_qty: Option<u32>,
    #[serde(default)]
    certifications: Vec<String>,
    summary: Option<String>,
    #[serde(default)]
    raw_ai_source: Option<String>,
    #[serde(default)]
    created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedResult {
    mode: Mode,
    component: String,
    country: String,
    summary: String,
    suppliers: Vec<PersistedSupplier>,
}

impl From<&Supplier> for PersistedSupplier {
    fn from(supplier: &Supplier) -> Self {
        Self {
            id: supplier.id.clone(),
            name: supplier.name.clone(),
            website: supplier.website.clone(),
            location: supplier.location.clone(),
            product: supplier.product.clone(),
            component_type: supplier.component_type.clone(),
            country: supplier.country.clone(),
            lead_time_days: supplier.lead_time_days,
            min_order_qty: supplier.min_order_qty,
            certifications: supplier.certifications.clone(),
            summary: supplier.summary.clone(),
            raw_ai_source: supplier.raw_ai_source.clone(),
            created_at: supplier.created_at,
        }
    }
}

impl From<PersistedSupplier> for Supplier {
    fn from(supplier: PersistedSupplier) -> Self {
        Self {
            id: supplier.id,
            name: supplier.name,
            website: supplier.website,
            location: supplier.location,
            product: supplier.product,
            component_type: supplier.component_type,
            country: supplier.country,
            lead_time_days: supplier.lead_time_days,
            min_order_qty: supplier.min_order_qty,
            certifications: supplier.certifications,
            summary: supplier.summary,
            raw_ai_source: supplier.raw_ai_source,
            created_at: supplier.created_at,
        }
    }
}

pub(crate) fn load_last_result(state_dir: &Path) -> Option<ResultSnapshot> {
    let content = match StateFiles::new(state_dir).load(LAST_RESULT_FILENAME) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(err) => {
            discovery_warn!("Failed to read last result from {:?}: {}", state_dir, err);
            return None;
        }
    };

    let persisted: PersistedResult = match ron::from_str(&content) {
        Ok(persisted) => persisted,
        Err(err) => {
            discovery_warn!("Failed to parse last result in {:?}: {}", state_dir, err);
            return None;
        }
    };

    discovery_info!(
        "Loaded last result ({} suppliers) from {:?}",
        persisted.suppliers.len(),
        state_dir
    );
    Some(ResultSnapshot {
        mode: persisted.mode,
        query: Query::new(persisted.component, persisted.country),
        results: ResultSet {
            suppliers: persisted.suppliers.into_iter().map(Supplier::from).collect(),
            summary: persisted.summary,
        },
    })
}

/// Best effort; a failed write is logged and otherwise ignored.
pub(crate) fn save_last_result(state_dir: &Path, snapshot: &ResultSnapshot) -> Option<PathBuf> {
    let persisted = PersistedResult {
        mode: snapshot.mode.clone(),
        component: snapshot.query.component.clone(),
        country: snapshot.query.country.clone(),
        summary: snapshot.results.summary.clone(),
        suppliers: snapshot
            .results
            .suppliers
            .iter()
            .map(PersistedSupplier::from)
            .collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&persisted, pretty) {
        Ok(text) => text,
        Err(err) => {
            discovery_error!("Failed to serialize last result: {}", err);
            return None;
        }
    };

    match StateFiles::new(state_dir).save(LAST_RESULT_FILENAME, &content) {
        Ok(path) => Some(path),
        Err(err) => {
            discovery_error!("Failed to write last result to {:?}: {}", state_dir, err);
            None
        }
    }
}
