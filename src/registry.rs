//! Attribute registry: which names on an entity type are dynamic attributes,
//! and which value table backs them.
//!
//! The query layer and the preloader never look attributes up through global
//! state; a registry is handed to them explicitly (usually as an
//! `Arc<dyn AttributeRegistry>`).

use crate::error::{HydraError, HydraResult};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Datatype class of a dynamic attribute. Each category is stored in its own value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueCategory {
    String,
    Text,
    Integer,
    Float,
    Decimal,
    Boolean,
    Datetime,
}

impl ValueCategory {
    /// Every supported category, in preload order
    pub const ALL: [ValueCategory; 7] = [
        ValueCategory::String,
        ValueCategory::Text,
        ValueCategory::Integer,
        ValueCategory::Float,
        ValueCategory::Decimal,
        ValueCategory::Boolean,
        ValueCategory::Datetime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueCategory::String => "string",
            ValueCategory::Text => "text",
            ValueCategory::Integer => "integer",
            ValueCategory::Float => "float",
            ValueCategory::Decimal => "decimal",
            ValueCategory::Boolean => "boolean",
            ValueCategory::Datetime => "datetime",
        }
    }
}

impl fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueCategory {
    type Err = HydraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| HydraError::Configuration(format!("unknown value category `{s}`")))
    }
}

/// Resolved location of one dynamic attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeReference {
    pub entity_type: String,
    pub name: String,
    pub value_table: String,
    pub category: ValueCategory,
}

/// The association through which records hold the values of one category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssociationDescriptor {
    /// Association name, e.g. `hydra_string_values`
    pub name: String,
    pub category: ValueCategory,
}

impl AssociationDescriptor {
    pub fn for_category(category: ValueCategory) -> Self {
        Self {
            name: format!("hydra_{category}_values"),
            category,
        }
    }
}

/// Source of dynamic-attribute metadata.
///
/// Implementors answer three questions; the remaining methods are derived from them.
pub trait AttributeRegistry: Send + Sync {
    /// Category of `name` on `entity_type`, or `None` when `name` is not a dynamic attribute
    fn attribute_category(&self, entity_type: &str, name: &str) -> Option<ValueCategory>;

    /// Value table storing `category` values for `entity_type`
    fn value_table(&self, entity_type: &str, category: ValueCategory) -> Option<String>;

    /// Categories `entity_type` declares attributes in.
    ///
    /// `None` means the type was never configured with dynamic attributes.
    fn value_categories(&self, entity_type: &str) -> Option<Vec<ValueCategory>>;

    fn is_dynamic_attribute(&self, entity_type: &str, name: &str) -> bool {
        self.attribute_category(entity_type, name).is_some()
    }

    /// Resolve `name` to its value table.
    ///
    /// # Errors
    ///
    /// `HydraError::Configuration` if `name` is not a dynamic attribute of
    /// `entity_type`, or if its category has no value table.
    fn resolve_value_table(&self, entity_type: &str, name: &str) -> HydraResult<AttributeReference> {
        let category = self.attribute_category(entity_type, name).ok_or_else(|| {
            HydraError::Configuration(format!(
                "`{name}` is not a dynamic attribute of `{entity_type}`"
            ))
        })?;
        let value_table = self.value_table(entity_type, category).ok_or_else(|| {
            HydraError::Configuration(format!(
                "`{entity_type}.{name}` is a {category} attribute but no {category} value table is registered"
            ))
        })?;
        Ok(AttributeReference {
            entity_type: entity_type.to_string(),
            name: name.to_string(),
            value_table,
            category,
        })
    }

    fn association_for(&self, category: ValueCategory) -> AssociationDescriptor {
        AssociationDescriptor::for_category(category)
    }
}

/// Dynamic attributes declared for one entity type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityAttributes {
    attributes: BTreeMap<String, ValueCategory>,
    value_tables: BTreeMap<ValueCategory, String>,
}

impl EntityAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute
    pub fn attribute(mut self, name: impl Into<String>, category: ValueCategory) -> Self {
        self.attributes.insert(name.into(), category);
        self
    }

    /// Register the value table backing `category`
    pub fn value_table(mut self, category: ValueCategory, table: impl Into<String>) -> Self {
        self.value_tables.insert(category, table.into());
        self
    }

    /// Register `<prefix>_<category>_values` for every declared category that has no table yet
    pub fn with_conventional_tables(mut self, prefix: &str) -> Self {
        let categories: Vec<ValueCategory> = self.attributes.values().copied().collect();
        for category in categories {
            self.value_tables
                .entry(category)
                .or_insert_with(|| conventional_value_table(prefix, category));
        }
        self
    }

    /// Declared categories in `ValueCategory::ALL` order, without duplicates
    pub fn categories(&self) -> Vec<ValueCategory> {
        ValueCategory::ALL
            .into_iter()
            .filter(|category| self.attributes.values().any(|c| c == category))
            .collect()
    }
}

/// `<prefix>_<category>_values`, e.g. `product_string_values`
pub fn conventional_value_table(prefix: &str, category: ValueCategory) -> String {
    format!("{prefix}_{category}_values")
}

/// In-memory registry keyed by entity type name
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entities: BTreeMap<String, EntityAttributes>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the attributes of `entity_type`
    pub fn register(mut self, entity_type: impl Into<String>, attributes: EntityAttributes) -> Self {
        self.entities.insert(entity_type.into(), attributes);
        self
    }

    pub fn entity(&self, entity_type: &str) -> Option<&EntityAttributes> {
        self.entities.get(entity_type)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

impl AttributeRegistry for StaticRegistry {
    fn attribute_category(&self, entity_type: &str, name: &str) -> Option<ValueCategory> {
        self.entities.get(entity_type)?.attributes.get(name).copied()
    }

    fn value_table(&self, entity_type: &str, category: ValueCategory) -> Option<String> {
        self.entities
            .get(entity_type)?
            .value_tables
            .get(&category)
            .cloned()
    }

    fn value_categories(&self, entity_type: &str) -> Option<Vec<ValueCategory>> {
        self.entities.get(entity_type).map(EntityAttributes::categories)
    }
}
