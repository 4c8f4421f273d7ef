//! Batched eager loading of dynamic-attribute values.
//!
//! After a relation materializes more than one record, the values of their
//! dynamic attributes are loaded with one query per (concrete type, value
//! category) pair instead of one query per record:
//!
//! 1. [`PreloadGrouper`] buckets the batch by type tag and category, skipping
//!    records whose association is already loaded and types the registry does
//!    not know.
//! 2. An [`AssociationPreloader`] loads each bucket in a single round trip;
//!    [`ValueTablePreloader`] does so through a [`HydraExecutor`](crate::HydraExecutor).

pub mod grouper;
#[doc(inline)]
pub use grouper::{PreloadGroup, PreloadGrouper};

pub mod loader;
#[doc(inline)]
pub use loader::{AssociationPreloader, ValueTablePreloader};
