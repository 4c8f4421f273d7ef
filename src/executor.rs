//! `HydraExecutor` - the seam between relations and the store that runs them.
//!
//! Relations render SQL with `sea_query` and hand it, with its bound values, to an
//! executor. Connection handling, pooling, transactions and cancellation all live
//! behind this trait; the query layer never schedules I/O itself.

use crate::error::HydraResult;
use crate::row::Row;
use sea_query::Values;

/// Trait for executing rendered queries
///
/// # Examples
///
/// ```
/// use hydraguard::{HydraExecutor, HydraResult, Row};
/// use sea_query::Values;
///
/// struct Empty;
///
/// impl HydraExecutor for Empty {
///     fn query_all(&self, _sql: &str, _values: &Values) -> HydraResult<Vec<Row>> {
///         Ok(vec![])
///     }
/// }
///
/// let rows = Empty.query_all("SELECT 1", &Values(vec![])).unwrap();
/// assert!(rows.is_empty());
/// ```
pub trait HydraExecutor {
    /// Execute a query and return all rows
    ///
    /// # Arguments
    ///
    /// * `sql` - SQL with `$n` placeholders
    /// * `values` - Values to bind, in placeholder order
    ///
    /// # Errors
    ///
    /// Returns `HydraError::Persistence` if the store cannot run the query.
    fn query_all(&self, sql: &str, values: &Values) -> HydraResult<Vec<Row>>;
}

impl<E> HydraExecutor for &E
where
    E: HydraExecutor + ?Sized,
{
    fn query_all(&self, sql: &str, values: &Values) -> HydraResult<Vec<Row>> {
        (**self).query_all(sql, values)
    }
}
