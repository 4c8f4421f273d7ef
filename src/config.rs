//! Entity and attribute configuration.
//!
//! [`HydraConfig::load`] reads `config/hydra.toml` (optional) and `HYDRA__*`
//! environment variables, then turns the `[[entities]]` tables into a
//! [`StaticRegistry`] and [`EntityDef`]s.
//!
//! ```toml
//! [[entities]]
//! name = "Product"
//! table = "products"
//!
//! [entities.attributes]
//! string = ["color", "title"]
//! integer = ["stock"]
//!
//! [[entities]]
//! name = "Laptop"
//! table = "products"
//! base_type = "Product"
//!
//! [entities.attributes]
//! string = ["cpu"]
//! ```

use crate::entity::EntityDef;
use crate::error::{HydraError, HydraResult};
use crate::registry::{EntityAttributes, StaticRegistry, ValueCategory};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeMap;

const CONFIG_FILE: &str = "config/hydra.toml";
const ENV_PREFIX: &str = "HYDRA";

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct HydraConfig {
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

/// One entity type and its dynamic attributes
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EntityConfig {
    pub name: String,
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Root of the STI hierarchy; value rows are keyed by it
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default = "default_inheritance_column")]
    pub inheritance_column: Option<String>,
    /// Attribute names keyed by category name (`string`, `integer`, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Overrides of the conventional `<base type>_<category>_values` tables
    #[serde(default)]
    pub value_tables: BTreeMap<String, String>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

fn default_inheritance_column() -> Option<String> {
    Some("type".to_string())
}

impl HydraConfig {
    /// Load the configuration from `config/hydra.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        settings.try_deserialize::<HydraConfig>().map_err(|e| {
            ConfigError::Message(format!(
                "Entity configuration could not be loaded from file or environment: {e}"
            ))
        })
    }

    /// Parse a TOML document with the same layout as `config/hydra.toml`
    pub fn from_toml_str(toml: &str) -> HydraResult<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize::<HydraConfig>()?)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    /// Entity definition of `name`
    ///
    /// # Errors
    ///
    /// `HydraError::Configuration` if `name` is not configured.
    pub fn entity_def(&self, name: &str) -> HydraResult<EntityDef> {
        self.entity(name)
            .map(EntityConfig::entity_def)
            .ok_or_else(|| HydraError::Configuration(format!("entity `{name}` is not configured")))
    }

    /// Build a registry with every configured entity.
    ///
    /// # Errors
    ///
    /// `HydraError::Configuration` for duplicate entity names, unknown category
    /// names, or an attribute declared under two categories.
    pub fn registry(&self) -> HydraResult<StaticRegistry> {
        let mut registry = StaticRegistry::new();
        for entity in &self.entities {
            if registry.entity(&entity.name).is_some() {
                return Err(HydraError::Configuration(format!(
                    "entity `{}` is configured twice",
                    entity.name
                )));
            }
            registry = registry.register(entity.name.clone(), entity.attributes()?);
        }
        log::debug!("registered {} entities from configuration", self.entities.len());
        Ok(registry)
    }
}

impl EntityConfig {
    pub fn base_type(&self) -> &str {
        self.base_type.as_deref().unwrap_or(&self.name)
    }

    pub fn entity_def(&self) -> EntityDef {
        let mut entity = EntityDef::new(&self.name, &self.table)
            .with_primary_key(&self.primary_key)
            .with_inheritance_column(self.inheritance_column.clone());
        if let Some(base_type) = &self.base_type {
            entity = entity.inherits(base_type);
        }
        entity
    }

    fn attributes(&self) -> HydraResult<EntityAttributes> {
        let mut seen: BTreeMap<&str, ValueCategory> = BTreeMap::new();
        let mut attributes = EntityAttributes::new();
        for (key, names) in &self.attributes {
            let category: ValueCategory = key.parse()?;
            for name in names {
                if let Some(previous) = seen.insert(name, category) {
                    return Err(HydraError::Configuration(format!(
                        "attribute `{}.{name}` is declared as both {previous} and {category}",
                        self.name
                    )));
                }
                attributes = attributes.attribute(name.clone(), category);
            }
        }
        attributes = attributes.with_conventional_tables(&snake_case(self.base_type()));
        for (key, table) in &self.value_tables {
            attributes = attributes.value_table(key.parse()?, table.clone());
        }
        Ok(attributes)
    }
}

/// `ProductVariant` -> `product_variant`
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AttributeRegistry;

    const CONFIG: &str = r#"
        [[entities]]
        name = "Product"
        table = "products"

        [entities.attributes]
        string = ["color", "title"]
        integer = ["stock"]

        [[entities]]
        name = "Laptop"
        table = "products"
        base_type = "Product"

        [entities.attributes]
        string = ["cpu"]
        boolean = ["refurbished"]

        [entities.value_tables]
        boolean = "laptop_flags"
    "#;

    #[test]
    fn test_defaults() {
        let config = HydraConfig::from_toml_str(CONFIG).unwrap();
        let product = config.entity("Product").unwrap();
        assert_eq!(product.primary_key, "id");
        assert_eq!(product.inheritance_column.as_deref(), Some("type"));
        assert_eq!(product.base_type(), "Product");
        assert_eq!(config.entity("Laptop").unwrap().base_type(), "Product");
    }

    #[test]
    fn test_registry_uses_base_type_tables() {
        let registry = HydraConfig::from_toml_str(CONFIG).unwrap().registry().unwrap();

        assert!(registry.is_dynamic_attribute("Product", "color"));
        assert!(!registry.is_dynamic_attribute("Product", "cpu"));
        assert_eq!(
            registry.value_table("Product", ValueCategory::Integer).as_deref(),
            Some("product_integer_values")
        );
        let cpu = registry.resolve_value_table("Laptop", "cpu").unwrap();
        assert_eq!(cpu.value_table, "product_string_values");
        let flag = registry.resolve_value_table("Laptop", "refurbished").unwrap();
        assert_eq!(flag.value_table, "laptop_flags");
        assert_eq!(
            registry.value_categories("Laptop"),
            Some(vec![ValueCategory::String, ValueCategory::Boolean])
        );
    }

    #[test]
    fn test_registry_matches_hand_built_one() {
        let from_config = HydraConfig::from_toml_str(CONFIG).unwrap().registry().unwrap();
        let by_hand = StaticRegistry::new().register(
            "Product",
            EntityAttributes::new()
                .attribute("color", ValueCategory::String)
                .attribute("title", ValueCategory::String)
                .attribute("stock", ValueCategory::Integer)
                .with_conventional_tables("product"),
        );
        for name in ["color", "title", "stock", "price"] {
            assert_eq!(
                from_config.attribute_category("Product", name),
                by_hand.attribute_category("Product", name)
            );
        }
        assert_eq!(
            from_config.value_categories("Product"),
            by_hand.value_categories("Product")
        );
    }

    #[test]
    fn test_entity_def_from_config() {
        let config = HydraConfig::from_toml_str(CONFIG).unwrap();
        let laptop = config.entity_def("Laptop").unwrap();
        assert_eq!(laptop.table(), "products");
        assert_eq!(laptop.base_type(), "Product");
        assert!(matches!(
            config.entity_def("Phone"),
            Err(HydraError::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let toml = r#"
            [[entities]]
            name = "Product"
            table = "products"

            [entities.attributes]
            blob = ["image"]
        "#;
        let config = HydraConfig::from_toml_str(toml).unwrap();
        assert_eq!(
            config.registry().unwrap_err(),
            HydraError::Configuration("unknown value category `blob`".to_string())
        );
    }

    #[test]
    fn test_attribute_in_two_categories_is_rejected() {
        let toml = r#"
            [[entities]]
            name = "Product"
            table = "products"

            [entities.attributes]
            string = ["size"]
            integer = ["size"]
        "#;
        let config = HydraConfig::from_toml_str(toml).unwrap();
        assert!(matches!(config.registry(), Err(HydraError::Configuration(_))));
    }

    #[test]
    fn test_empty_document() {
        let config = HydraConfig::from_toml_str("").unwrap();
        assert!(config.entities.is_empty());
        assert_eq!(config.registry().unwrap().entity_types().count(), 0);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("Product"), "product");
        assert_eq!(snake_case("ProductVariant"), "product_variant");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }
}
