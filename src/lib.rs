//! # Hydraguard
//!
//! Dynamic (EAV) attributes for SQL relations, built on `sea_query`.
//!
//! Entities keep their native columns in their own table. Extra attributes live in
//! one value table per datatype category (`product_string_values`,
//! `product_integer_values`, ...). A [`Relation`] lets callers filter and order by
//! either kind of name: dynamic ones are rewritten into aliased joins against the
//! value tables, and [`Relation::all`] batch-preloads the values of every record it
//! returns, one query per (type, category) pair.
//!
//! ```
//! use std::sync::Arc;
//! use hydraguard::{EntityAttributes, EntityDef, Predicate, Relation, StaticRegistry, ValueCategory};
//! use sea_query::{Order, PostgresQueryBuilder};
//!
//! let registry = StaticRegistry::new().register(
//!     "Product",
//!     EntityAttributes::new()
//!         .attribute("color", ValueCategory::String)
//!         .with_conventional_tables("product"),
//! );
//! let products = Relation::new(EntityDef::new("Product", "products"), Arc::new(registry));
//!
//! let sql = products
//!     .filter_by([Predicate::is_null("color")])?
//!     .order_by([("title", Order::Asc)])?
//!     .to_string(PostgresQueryBuilder);
//! assert!(sql.contains(r#"LEFT JOIN "product_string_values" AS "product_string_values_left_color""#));
//! assert!(sql.contains(r#""product_string_values_left_color"."value" IS NULL"#));
//! # Ok::<(), hydraguard::HydraError>(())
//! ```
//!
//! See `README.md` for configuration.

pub mod config;
pub mod eager;
pub mod entity;
pub mod error;
pub mod executor;
pub mod query;
pub mod record;
pub mod registry;
pub mod row;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(feature = "tracing")]
pub mod tracing_helpers;

pub use config::{EntityConfig, HydraConfig};
pub use eager::{AssociationPreloader, PreloadGroup, PreloadGrouper, ValueTablePreloader};
pub use entity::EntityDef;
pub use error::{HydraError, HydraResult};
pub use executor::HydraExecutor;
pub use query::{
    alias_for, JoinAliasKey, JoinKind, JoinSet, JoinSpec, OrderField, PendingOrderField,
    Predicate, Relation, SelectQuery,
};
pub use record::{HydraRecord, Record};
pub use registry::{
    AssociationDescriptor, AttributeReference, AttributeRegistry, EntityAttributes,
    StaticRegistry, ValueCategory,
};
pub use row::{ColumnInfo, FromRow, Row};
