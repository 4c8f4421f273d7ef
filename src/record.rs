//! Records materialized from a relation, and the hooks the preloader needs on them.

use crate::entity::EntityDef;
use crate::error::{HydraError, HydraResult};
use crate::registry::{AssociationDescriptor, ValueCategory};
use crate::row::{FromRow, Row};
use sea_query::Value;
use std::collections::BTreeMap;

/// A record that can hold preloaded dynamic-attribute values.
///
/// `entity_type` is the record's concrete type tag; the preloader groups batches
/// by it instead of inspecting Rust types.
pub trait HydraRecord {
    fn entity_type(&self) -> &str;

    /// Value matched against `entity_id` in value tables
    fn primary_key(&self) -> Option<&Value>;

    fn is_association_loaded(&self, association: &AssociationDescriptor) -> bool;

    /// Store the values of `association`, marking it loaded even when `values` is empty
    fn store_association(&mut self, association: &AssociationDescriptor, values: BTreeMap<String, Value>);
}

/// Polymorphic record: native columns plus per-category dynamic values
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity_type: String,
    primary_key: Value,
    columns: BTreeMap<String, Value>,
    attributes: BTreeMap<ValueCategory, BTreeMap<String, Value>>,
}

impl Record {
    pub fn new(entity_type: impl Into<String>, primary_key: impl Into<Value>) -> Self {
        Self {
            entity_type: entity_type.into(),
            primary_key: primary_key.into(),
            columns: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Loaded value of dynamic attribute `name`
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.values().find_map(|values| values.get(name))
    }

    pub fn is_category_loaded(&self, category: ValueCategory) -> bool {
        self.attributes.contains_key(&category)
    }

    pub fn loaded_categories(&self) -> impl Iterator<Item = ValueCategory> + '_ {
        self.attributes.keys().copied()
    }
}

impl HydraRecord for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn primary_key(&self) -> Option<&Value> {
        Some(&self.primary_key)
    }

    fn is_association_loaded(&self, association: &AssociationDescriptor) -> bool {
        self.is_category_loaded(association.category)
    }

    fn store_association(&mut self, association: &AssociationDescriptor, values: BTreeMap<String, Value>) {
        self.attributes.insert(association.category, values);
    }
}

impl FromRow for Record {
    /// The concrete type comes from the entity's inheritance column when the row
    /// carries a non-null string there, and is the entity's own name otherwise.
    fn from_row(entity: &EntityDef, row: &Row) -> HydraResult<Self> {
        let primary_key = row.get(entity.primary_key()).cloned().ok_or_else(|| {
            HydraError::Parse(format!(
                "row of `{}` has no `{}` column",
                entity.table(),
                entity.primary_key()
            ))
        })?;

        let entity_type = entity
            .inheritance_column()
            .and_then(|column| row.get(column))
            .and_then(|value| match value {
                Value::String(Some(s)) => Some(s.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| entity.name().to_string());

        let columns = row
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        Ok(Self {
            entity_type,
            primary_key,
            columns,
            attributes: BTreeMap::new(),
        })
    }
}
