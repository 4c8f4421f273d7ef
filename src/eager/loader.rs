//! Batched loading of one value table for a group of records.
//!
//! One group, one query:
//!
//! ```sql
//! SELECT "entity_id", "name", "value" FROM "<value table>"
//! WHERE "entity_type" = '<base type>' AND "entity_id" IN (<ids>)
//! ```
//!
//! Rows are then distributed back onto the records by `entity_id`, the same
//! selectinload shape used for has-many relations.

use crate::eager::grouper::PreloadGroup;
use crate::entity::EntityDef;
use crate::error::{HydraError, HydraResult};
use crate::executor::HydraExecutor;
use crate::query::{Ident, ENTITY_ID_COLUMN, ENTITY_TYPE_COLUMN, NAME_COLUMN, VALUE_COLUMN};
use crate::record::HydraRecord;
use sea_query::{Expr, ExprTrait, PostgresQueryBuilder, Query, SelectStatement, Value};
use std::collections::{BTreeMap, HashMap};

/// Loads one association for a group of records, in a single round trip
pub trait AssociationPreloader<R> {
    /// Load `group.association` for every record in `records` and store it on each,
    /// including records with no value rows.
    fn preload(&self, group: &PreloadGroup, records: &mut [&mut R]) -> HydraResult<()>;
}

/// [`AssociationPreloader`] reading value tables through a [`HydraExecutor`]
pub struct ValueTablePreloader<'a, Ex: ?Sized> {
    executor: &'a Ex,
    base_type: String,
}

impl<'a, Ex> ValueTablePreloader<'a, Ex>
where
    Ex: HydraExecutor + ?Sized,
{
    /// Value rows are filtered on `entity`'s base type, shared by its whole hierarchy
    pub fn new(executor: &'a Ex, entity: &EntityDef) -> Self {
        Self {
            executor,
            base_type: entity.base_type().to_string(),
        }
    }

    /// Query for the values of `ids` in `value_table`
    pub fn values_query(&self, value_table: &str, ids: Vec<Value>) -> SelectStatement {
        let mut query = Query::select();
        query
            .columns([
                Ident::new(ENTITY_ID_COLUMN),
                Ident::new(NAME_COLUMN),
                Ident::new(VALUE_COLUMN),
            ])
            .from(Ident::new(value_table))
            .and_where(Expr::col(Ident::new(ENTITY_TYPE_COLUMN)).eq(self.base_type.as_str()))
            .and_where(Expr::col(Ident::new(ENTITY_ID_COLUMN)).is_in(ids));
        query
    }
}

impl<R, Ex> AssociationPreloader<R> for ValueTablePreloader<'_, Ex>
where
    R: HydraRecord,
    Ex: HydraExecutor + ?Sized,
{
    fn preload(&self, group: &PreloadGroup, records: &mut [&mut R]) -> HydraResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut ids: Vec<Value> = Vec::with_capacity(records.len());
        let mut seen = std::collections::HashSet::new();
        for record in records.iter() {
            let pk = record.primary_key().ok_or_else(|| {
                HydraError::Query(format!(
                    "cannot preload {} for a `{}` record without a primary key",
                    group.association.name, group.entity_type
                ))
            })?;
            if seen.insert(value_key(pk)) {
                ids.push(pk.clone());
            }
        }

        let (sql, values) = self
            .values_query(&group.value_table, ids)
            .build(PostgresQueryBuilder);
        log::debug!(
            "preloading {} for {} `{}` records: {}",
            group.association.name,
            records.len(),
            group.entity_type,
            sql
        );
        let rows = self.executor.query_all(&sql, &values)?;

        let mut by_entity: HashMap<String, BTreeMap<String, Value>> = HashMap::new();
        for row in &rows {
            let entity_id = row.get(ENTITY_ID_COLUMN).ok_or_else(|| {
                HydraError::Parse(format!(
                    "`{}` row has no `{ENTITY_ID_COLUMN}` column",
                    group.value_table
                ))
            })?;
            let name = match row.get(NAME_COLUMN) {
                Some(Value::String(Some(name))) => name.to_string(),
                _ => {
                    return Err(HydraError::Parse(format!(
                        "`{}` row has no string `{NAME_COLUMN}` column",
                        group.value_table
                    )))
                }
            };
            let value = row.get(VALUE_COLUMN).cloned().ok_or_else(|| {
                HydraError::Parse(format!(
                    "`{}` row has no `{VALUE_COLUMN}` column",
                    group.value_table
                ))
            })?;
            by_entity
                .entry(value_key(entity_id))
                .or_default()
                .insert(name, value);
        }

        for record in records.iter_mut() {
            let values = record
                .primary_key()
                .and_then(|pk| by_entity.get(&value_key(pk)))
                .cloned()
                .unwrap_or_default();
            record.store_association(&group.association, values);
        }
        Ok(())
    }
}

/// Grouping key for a primary key value.
///
/// Integer widths are folded together so an `INT` id on the record matches a
/// `BIGINT` `entity_id` coming back from the value table.
fn value_key(value: &Value) -> String {
    match value {
        Value::TinyInt(Some(i)) => format!("int:{i}"),
        Value::SmallInt(Some(i)) => format!("int:{i}"),
        Value::Int(Some(i)) => format!("int:{i}"),
        Value::BigInt(Some(i)) => format!("int:{i}"),
        Value::TinyUnsigned(Some(u)) => format!("int:{u}"),
        Value::SmallUnsigned(Some(u)) => format!("int:{u}"),
        Value::Unsigned(Some(u)) => format!("int:{u}"),
        Value::BigUnsigned(Some(u)) => format!("int:{u}"),
        Value::String(Some(s)) => format!("str:{s}"),
        other => format!("{other:?}"),
    }
}
