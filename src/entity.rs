//! Entity definitions that relations are bound to.

/// Table-level description of an entity type
///
/// # Example
///
/// ```
/// use hydraguard::EntityDef;
///
/// let def = EntityDef::new("Product", "products");
/// assert_eq!(def.base_type(), "Product");
/// assert_eq!(def.primary_key(), "id");
///
/// let def = EntityDef::new("Laptop", "products").inherits("Product");
/// assert_eq!(def.base_type(), "Product");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    name: String,
    base_type: Option<String>,
    table: String,
    primary_key: String,
    inheritance_column: Option<String>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_type: None,
            table: table.into(),
            primary_key: "id".to_string(),
            inheritance_column: Some("type".to_string()),
        }
    }

    /// Store value rows under `base_type` instead of this entity's own name
    pub fn inherits(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Column holding the concrete type of each row; `None` disables polymorphic loading
    pub fn with_inheritance_column(mut self, column: Option<String>) -> Self {
        self.inheritance_column = column;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discriminator written to `entity_type` in value tables
    pub fn base_type(&self) -> &str {
        self.base_type.as_deref().unwrap_or(&self.name)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn inheritance_column(&self) -> Option<&str> {
        self.inheritance_column.as_deref()
    }
}
