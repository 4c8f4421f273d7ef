//! Spans around the crate's round trips to the store.
//!
//! Only compiled with the `tracing` feature. Callers enter the returned span for
//! the duration of the operation:
//!
//! ```ignore
//! let _span = tracing_helpers::execute_query_span(&sql).entered();
//! ```

use crate::registry::ValueCategory;
use tracing::{info_span, Span};

/// Span for running a relation's SELECT
pub fn execute_query_span(sql: &str) -> Span {
    info_span!("hydraguard.execute_query", db.statement = %sql)
}

/// Span for one batched value-table load
pub fn preload_span(entity_type: &str, category: ValueCategory, records: usize) -> Span {
    info_span!(
        "hydraguard.preload",
        entity_type = %entity_type,
        category = %category,
        records = records
    )
}
