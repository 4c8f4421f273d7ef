//! Query execution methods for `Relation`.
//!
//! `all` finalizes the relation, runs it through a [`HydraExecutor`], maps the rows
//! and batch-preloads dynamic attributes for multi-record results. `first` fetches
//! at most one record and leaves its attributes unloaded.

use crate::eager::{PreloadGrouper, ValueTablePreloader};
use crate::error::HydraResult;
use crate::executor::HydraExecutor;
use crate::query::relation::Relation;
use crate::record::HydraRecord;
use crate::row::FromRow;
use sea_query::PostgresQueryBuilder;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

impl Relation {
    /// Execute the relation and return all records
    ///
    /// # Example
    ///
    /// ```
    /// use hydraguard::{
    ///     EntityAttributes, EntityDef, HydraExecutor, HydraResult, Record, Relation, Row,
    ///     StaticRegistry, ValueCategory,
    /// };
    /// use sea_query::{Value, Values};
    /// use std::sync::Arc;
    ///
    /// struct OneProduct;
    ///
    /// impl HydraExecutor for OneProduct {
    ///     fn query_all(&self, _sql: &str, _values: &Values) -> HydraResult<Vec<Row>> {
    ///         Ok(vec![Row::from_pairs([("id", Value::from(1i64))])])
    ///     }
    /// }
    ///
    /// let registry = StaticRegistry::new().register(
    ///     "Product",
    ///     EntityAttributes::new()
    ///         .attribute("color", ValueCategory::String)
    ///         .with_conventional_tables("product"),
    /// );
    ///
    /// let records: Vec<Record> = Relation::new(EntityDef::new("Product", "products"), Arc::new(registry))
    ///     .all(&OneProduct)?;
    /// assert_eq!(records.len(), 1);
    /// # Ok::<(), hydraguard::HydraError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// `HydraError::Persistence` from the executor, `HydraError::Parse` from row
    /// mapping, and any preload error.
    pub fn all<R, Ex>(&self, executor: &Ex) -> HydraResult<Vec<R>>
    where
        R: FromRow + HydraRecord,
        Ex: HydraExecutor + ?Sized,
    {
        let mut records: Vec<R> = self.fetch(executor)?;

        if records.len() > 1 {
            let preloader = ValueTablePreloader::new(executor, self.entity());
            let calls = PreloadGrouper::new(self.registry().clone())
                .group_and_preload(&mut records, &preloader)?;
            log::debug!(
                "loaded {} `{}` records with {calls} preload queries",
                records.len(),
                self.entity().name()
            );
        }
        Ok(records)
    }

    /// Execute the relation with `LIMIT 1` and return the record, if any
    ///
    /// No attributes are preloaded for a single record.
    pub fn first<R, Ex>(&self, executor: &Ex) -> HydraResult<Option<R>>
    where
        R: FromRow + HydraRecord,
        Ex: HydraExecutor + ?Sized,
    {
        let records: Vec<R> = self.limit(1).fetch(executor)?;
        Ok(records.into_iter().next())
    }

    fn fetch<R, Ex>(&self, executor: &Ex) -> HydraResult<Vec<R>>
    where
        R: FromRow,
        Ex: HydraExecutor + ?Sized,
    {
        let (sql, values) = self.build(PostgresQueryBuilder);

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(&sql).entered();

        log::debug!("executing: {sql}");
        let rows = executor.query_all(&sql, &values)?;
        rows.iter()
            .map(|row| R::from_row(self.entity(), row))
            .collect()
    }
}
