use crate::Query;

/// Summary line shown with a completed result set.
///
/// The count always comes from the fetched suppliers, never from the
/// job's own `supplier_count`.
pub fn summary_text(count: usize, query: &Query, mock: bool) -> String {
    let tag = if mock { " (MOCK DATA)" } else { "" };
    format!(
        "Found {count} suppliers for {} in {}{tag}.",
        query.component, query.country
    )
}
