//! Query building and execution for relations with dynamic attributes.
//!
//! # Architecture
//!
//! - **Select**: the base SELECT builder over `sea_query` (`SelectQuery`). It knows
//!   nothing about dynamic attributes.
//! - **Join**: alias derivation and the per-relation join set (`JoinSet`).
//! - **Relation**: the immutable relation snapshot. Filters and orders on dynamic
//!   attributes are rewritten into value-table joins before reaching `SelectQuery`.
//! - **Execution**: `all` / `first`, followed by batched attribute preloading.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use hydraguard::{EntityAttributes, EntityDef, Predicate, Relation, StaticRegistry, ValueCategory};
//! use sea_query::PostgresQueryBuilder;
//!
//! let registry = StaticRegistry::new().register(
//!     "Product",
//!     EntityAttributes::new()
//!         .attribute("color", ValueCategory::String)
//!         .with_conventional_tables("product"),
//! );
//! let products = Relation::new(EntityDef::new("Product", "products"), Arc::new(registry));
//!
//! let red = products.filter_by([Predicate::eq("color", "red")])?;
//! let sql = red.to_string(PostgresQueryBuilder);
//! assert!(sql.contains(r#"INNER JOIN "product_string_values" AS "product_string_values_inner_color""#));
//! # Ok::<(), hydraguard::HydraError>(())
//! ```

use sea_query::{Iden, Value};

// Base SELECT builder
pub mod select;
#[doc(inline)]
pub use select::SelectQuery;

// Join alias derivation and dedup
pub mod join;
#[doc(inline)]
pub use join::{alias_for, JoinAliasKey, JoinKind, JoinSet, JoinSpec};

// Relation snapshots and dynamic-attribute rewriting
pub mod relation;
#[doc(inline)]
pub use relation::{OrderField, PendingOrderField, Predicate, Relation};

// Query execution methods
pub mod execution;

/// Column of a value table holding the owning entity's primary key
pub const ENTITY_ID_COLUMN: &str = "entity_id";
/// Column of a value table holding the owning entity's base type
pub const ENTITY_TYPE_COLUMN: &str = "entity_type";
/// Column of a value table holding the attribute name
pub const NAME_COLUMN: &str = "name";
/// Column of a value table holding the attribute value
pub const VALUE_COLUMN: &str = "value";

/// Owned identifier for table, alias and column names known only at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ident(String);

impl Ident {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Iden for Ident {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

/// Whether `value` is a typed SQL `NULL`, e.g. `Value::String(None)`
pub(crate) fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::ChronoDateTimeLocal(None)
            | Value::ChronoDateTimeWithTimeZone(None)
            | Value::Uuid(None)
            | Value::Decimal(None)
    )
}

/// Fold typed nulls into `None`, so every `NULL` comparison takes the same path
pub(crate) fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|value| !is_null(value))
}
