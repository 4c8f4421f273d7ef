//! Join alias derivation and per-relation join deduplication.
//!
//! A value-table join is identified by its [`JoinAliasKey`]: the value table, the
//! join kind and the attribute name. The alias is a pure function of that key, so
//! the same attribute joined the same way always lands on the same alias, in every
//! relation. A [`JoinSet`] never holds two joins with the same key.

use crate::entity::EntityDef;
use crate::query::{is_null, Ident, ENTITY_ID_COLUMN, ENTITY_TYPE_COLUMN, NAME_COLUMN};
use sea_query::{Condition, Expr, ExprTrait, Value};
use std::fmt;

/// Join type used for a value table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    /// `Left` for a `NULL` comparison (rows without a value must survive), `Inner` otherwise.
    ///
    /// Typed nulls such as `Value::Int(None)` count as `NULL`.
    pub fn for_value(value: Option<&Value>) -> Self {
        match value {
            Some(value) if !is_null(value) => JoinKind::Inner,
            _ => JoinKind::Left,
        }
    }

    /// Lowercase name used inside aliases
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
        }
    }

    pub fn sql_join_type(&self) -> sea_query::JoinType {
        match self {
            JoinKind::Inner => sea_query::JoinType::InnerJoin,
            JoinKind::Left => sea_query::JoinType::LeftJoin,
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the alias of a value-table join: `<table>_<inner|left>_<attribute>`.
///
/// Collision-free as long as each category has one value table and attribute
/// names are unique per entity type.
///
/// ```
/// use hydraguard::{alias_for, JoinKind};
///
/// assert_eq!(
///     alias_for("product_string_values", JoinKind::Inner, "color"),
///     "product_string_values_inner_color"
/// );
/// ```
pub fn alias_for(table: &str, kind: JoinKind, attribute: &str) -> String {
    format!("{table}_{kind}_{attribute}")
}

/// Dedup identity of a value-table join
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinAliasKey {
    pub table: String,
    pub kind: JoinKind,
    pub attribute: String,
}

impl JoinAliasKey {
    pub fn new(table: impl Into<String>, kind: JoinKind, attribute: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind,
            attribute: attribute.into(),
        }
    }

    pub fn alias(&self) -> String {
        alias_for(&self.table, self.kind, &self.attribute)
    }
}

/// One value-table join of a relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub alias: String,
    pub table: String,
    pub kind: JoinKind,
    pub attribute: String,
}

impl JoinSpec {
    pub fn new(key: &JoinAliasKey) -> Self {
        Self {
            alias: key.alias(),
            table: key.table.clone(),
            kind: key.kind,
            attribute: key.attribute.clone(),
        }
    }

    pub fn key(&self) -> JoinAliasKey {
        JoinAliasKey::new(&self.table, self.kind, &self.attribute)
    }

    /// ON condition tying value rows to `entity` rows:
    ///
    /// ```text
    /// <table>.<pk> = <alias>.entity_id
    ///   AND <alias>.entity_type = '<base type>'
    ///   AND <alias>.name = '<attribute>'
    /// ```
    pub fn on_condition(&self, entity: &EntityDef) -> Condition {
        let alias = || Ident::new(&self.alias);
        Condition::all()
            .add(
                Expr::col((Ident::new(entity.table()), Ident::new(entity.primary_key())))
                    .equals((alias(), Ident::new(ENTITY_ID_COLUMN))),
            )
            .add(Expr::col((alias(), Ident::new(ENTITY_TYPE_COLUMN))).eq(entity.base_type()))
            .add(Expr::col((alias(), Ident::new(NAME_COLUMN))).eq(self.attribute.as_str()))
    }
}

/// Joins of one relation, in insertion order, unique by [`JoinAliasKey`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSet {
    joins: Vec<JoinSpec>,
}

impl JoinSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &JoinAliasKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &JoinAliasKey) -> Option<&JoinSpec> {
        self.joins.iter().find(|spec| {
            spec.kind == key.kind && spec.table == key.table && spec.attribute == key.attribute
        })
    }

    /// Alias of the join registered under `key`
    pub fn alias_of(&self, key: &JoinAliasKey) -> Option<&str> {
        self.get(key).map(|spec| spec.alias.as_str())
    }

    /// Insert `spec` under `key`. Returns `false` (and keeps the existing join) if
    /// `key` is already present.
    pub fn insert(&mut self, key: &JoinAliasKey, spec: JoinSpec) -> bool {
        if self.contains(key) {
            return false;
        }
        self.joins.push(spec);
        true
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JoinSpec> {
        self.joins.iter()
    }

    /// Joins on `attribute`, whatever their kind
    pub fn for_attribute<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a JoinSpec> + 'a {
        self.joins.iter().filter(move |spec| spec.attribute == attribute)
    }
}
