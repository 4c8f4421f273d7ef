//! Relation snapshots with dynamic-attribute rewriting.
//!
//! A [`Relation`] is an immutable value: every operation returns a new snapshot
//! and leaves the receiver untouched, join set and pending order included. Two
//! callers holding different snapshots never see each other's joins.
//!
//! Filters and orders are inspected against the [`AttributeRegistry`]:
//!
//! - a filter on a dynamic attribute joins its value table (INNER for a value,
//!   LEFT for `NULL`) and compares `<alias>.value`;
//! - an order on a dynamic attribute is parked in the pending list and turned into
//!   a join by [`Relation::finalize_build`], because the right join kind depends on
//!   filters that may still be added;
//! - anything else goes to [`SelectQuery`] unchanged.

use crate::entity::EntityDef;
use crate::error::HydraResult;
use crate::query::join::{JoinAliasKey, JoinKind, JoinSet, JoinSpec};
use crate::query::select::SelectQuery;
use crate::query::{non_null, Ident, VALUE_COLUMN};
use crate::registry::AttributeRegistry;
use sea_query::{Expr, ExprTrait, IntoCondition, Order, QueryBuilder, Value, Values};
use std::fmt;
use std::sync::Arc;

/// Equality predicate of a `filter_by` call; a `None` value means SQL `NULL`.
///
/// Typed nulls (`Value::String(None)`, ...) are stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub name: String,
    pub value: Option<Value>,
}

impl Predicate {
    pub fn eq(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: non_null(Some(value.into())),
        }
    }

    pub fn is_null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

impl<N: Into<String>> From<(N, Value)> for Predicate {
    fn from((name, value): (N, Value)) -> Self {
        Predicate::eq(name, value)
    }
}

impl<N: Into<String>> From<(N, Option<Value>)> for Predicate {
    fn from((name, value): (N, Option<Value>)) -> Self {
        Self {
            name: name.into(),
            value: non_null(value),
        }
    }
}

/// Field of an `order_by`/`reorder` call. Bare names order ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderField {
    pub name: String,
    pub order: Order,
}

impl OrderField {
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Order::Asc,
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Order::Desc,
        }
    }
}

impl From<&str> for OrderField {
    fn from(name: &str) -> Self {
        OrderField::asc(name)
    }
}

impl From<String> for OrderField {
    fn from(name: String) -> Self {
        OrderField::asc(name)
    }
}

impl<N: Into<String>> From<(N, Order)> for OrderField {
    fn from((name, order): (N, Order)) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }
}

/// Dynamic attribute waiting for its order join to be chosen
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrderField {
    pub name: String,
    pub value_table: String,
    pub order: Order,
}

/// Deferred query over one entity type
///
/// Every name handed to `filter_by`/`order_by` that the registry knows as a
/// dynamic attribute of the entity type is routed through a value-table join;
/// all other names are native columns.
#[derive(Clone)]
pub struct Relation {
    registry: Arc<dyn AttributeRegistry>,
    entity: EntityDef,
    base: SelectQuery,
    joins: JoinSet,
    pending_order: Vec<PendingOrderField>,
    native_order: Vec<OrderField>,
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("entity", &self.entity)
            .field("base", &self.base)
            .field("joins", &self.joins)
            .field("pending_order", &self.pending_order)
            .field("native_order", &self.native_order)
            .finish_non_exhaustive()
    }
}

impl Relation {
    /// Create a relation over every row of `entity`'s table
    pub fn new(entity: EntityDef, registry: Arc<dyn AttributeRegistry>) -> Self {
        let base = SelectQuery::new(entity.table());
        Self {
            registry,
            entity,
            base,
            joins: JoinSet::new(),
            pending_order: Vec::new(),
            native_order: Vec::new(),
        }
    }

    pub fn entity(&self) -> &EntityDef {
        &self.entity
    }

    pub fn registry(&self) -> &Arc<dyn AttributeRegistry> {
        &self.registry
    }

    /// Underlying builder; pending dynamic orders are not applied yet
    pub fn base(&self) -> &SelectQuery {
        &self.base
    }

    pub fn joins(&self) -> &JoinSet {
        &self.joins
    }

    /// Dynamic order fields not yet turned into joins
    pub fn pending_order(&self) -> &[PendingOrderField] {
        &self.pending_order
    }

    /// Order fields already applied to the base builder, in clause order.
    ///
    /// Finalized dynamic fields appear as `<alias>.value`.
    pub fn native_order(&self) -> &[OrderField] {
        &self.native_order
    }

    /// Filter by `name = value` predicates, folded in order.
    ///
    /// A predicate on a dynamic attribute joins the attribute's value table
    /// (reusing an identical join if one exists) and compares `<alias>.value`.
    /// Any other predicate becomes a native column filter. An empty list returns
    /// an unchanged copy.
    ///
    /// # Errors
    ///
    /// `HydraError::Configuration` when a dynamic attribute has no value table.
    pub fn filter_by<I, P>(&self, predicates: I) -> HydraResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Predicate>,
    {
        predicates
            .into_iter()
            .try_fold(self.clone(), |relation, predicate| {
                relation.apply_predicate(predicate.into())
            })
    }

    /// Add an arbitrary condition to the base builder, untouched
    pub fn filter<F>(&self, condition: F) -> Self
    where
        F: IntoCondition,
    {
        let mut relation = self.clone();
        relation.map_base(|base| base.filter(condition));
        relation
    }

    /// Order by `fields`.
    ///
    /// Native fields are applied in the given order. Dynamic fields are queued,
    /// deduplicated by name (first appearance wins), and joined at
    /// [`finalize_build`](Self::finalize_build), after every native field.
    ///
    /// # Errors
    ///
    /// `HydraError::Configuration` when a dynamic attribute has no value table.
    pub fn order_by<I, F>(&self, fields: I) -> HydraResult<Self>
    where
        I: IntoIterator<Item = F>,
        F: Into<OrderField>,
    {
        let mut relation = self.clone();
        for field in fields.into_iter().map(Into::into) {
            let entity_type = relation.entity.name();
            if relation.registry.is_dynamic_attribute(entity_type, &field.name) {
                if relation.pending_order.iter().any(|p| p.name == field.name) {
                    continue;
                }
                let reference = relation.registry.resolve_value_table(entity_type, &field.name)?;
                relation.pending_order.push(PendingOrderField {
                    name: reference.name,
                    value_table: reference.value_table,
                    order: field.order,
                });
            } else {
                relation.push_native_order(field);
            }
        }
        Ok(relation)
    }

    /// Replace all order state with `fields`, taken verbatim as native columns.
    ///
    /// Unlike [`order_by`](Self::order_by) no dynamic-attribute detection happens
    /// here: a dynamic attribute name is ordered as a column of the entity table.
    /// An empty list returns an unchanged copy.
    pub fn reorder<I, F>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<OrderField>,
    {
        let fields: Vec<OrderField> = fields.into_iter().map(Into::into).collect();
        let mut relation = self.clone();
        if fields.is_empty() {
            return relation;
        }
        relation.pending_order.clear();
        relation.native_order.clear();
        relation.map_base(SelectQuery::clear_order);
        for field in fields {
            relation.push_native_order(field);
        }
        relation
    }

    /// Resolve pending dynamic order fields into joins and ORDER BY clauses.
    ///
    /// An INNER join already present for the attribute is reused; otherwise a
    /// LEFT join is added (once). The pending list is drained, so calling this
    /// again on the result is a no-op.
    pub fn finalize_build(&self) -> Self {
        let mut relation = self.clone();
        for field in std::mem::take(&mut relation.pending_order) {
            let inner = JoinAliasKey::new(&field.value_table, JoinKind::Inner, &field.name);
            let alias = match relation.joins.alias_of(&inner) {
                Some(alias) => {
                    log::trace!("ordering `{}` reuses inner join {alias}", field.name);
                    alias.to_string()
                }
                None => relation.ensure_join(JoinAliasKey::new(
                    &field.value_table,
                    JoinKind::Left,
                    &field.name,
                )),
            };
            let column = (Ident::new(&alias), Ident::new(VALUE_COLUMN));
            let order = field.order.clone();
            relation.map_base(|base| base.order_by(column, order));
            relation.native_order.push(OrderField {
                name: format!("{alias}.{VALUE_COLUMN}"),
                order: field.order,
            });
        }
        relation
    }

    pub fn limit(&self, limit: u64) -> Self {
        let mut relation = self.clone();
        relation.map_base(|base| base.limit(limit));
        relation
    }

    pub fn offset(&self, offset: u64) -> Self {
        let mut relation = self.clone();
        relation.map_base(|base| base.offset(offset));
        relation
    }

    /// Finalize and render SQL with placeholders plus the values to bind
    pub fn build<T: QueryBuilder>(&self, builder: T) -> (String, Values) {
        self.finalize_build().base.build(builder)
    }

    /// Finalize and render SQL with values inlined
    pub fn to_string<T: QueryBuilder>(&self, builder: T) -> String {
        self.finalize_build().base.to_string(builder)
    }

    fn apply_predicate(mut self, predicate: Predicate) -> HydraResult<Self> {
        let Predicate { name, value } = predicate;
        let value = non_null(value);
        let entity_type = self.entity.name();
        if !self.registry.is_dynamic_attribute(entity_type, &name) {
            self.map_base(|base| base.filter_column(&name, value));
            return Ok(self);
        }

        let reference = self.registry.resolve_value_table(entity_type, &name)?;
        let kind = JoinKind::for_value(value.as_ref());
        let alias = self.ensure_join(JoinAliasKey::new(reference.value_table, kind, reference.name));

        let target = Expr::col((Ident::new(&alias), Ident::new(VALUE_COLUMN)));
        let condition = match value {
            Some(value) => target.eq(value),
            None => target.is_null(),
        };
        self.map_base(|base| base.filter(condition));
        Ok(self)
    }

    /// Join `key` unless already joined; returns its alias either way
    fn ensure_join(&mut self, key: JoinAliasKey) -> String {
        if let Some(alias) = self.joins.alias_of(&key) {
            return alias.to_string();
        }
        let spec = JoinSpec::new(&key);
        log::debug!(
            "joining {} as {} ({}) for `{}.{}`",
            spec.table,
            spec.alias,
            spec.kind,
            self.entity.name(),
            spec.attribute
        );
        let on = spec.on_condition(&self.entity);
        let (kind, table, alias) = (spec.kind, spec.table.clone(), spec.alias.clone());
        self.map_base(|base| base.join_as(kind, &table, &alias, on));
        self.joins.insert(&key, spec);
        alias
    }

    fn push_native_order(&mut self, field: OrderField) {
        let order = field.order.clone();
        self.map_base(|base| base.order_by_column(&field.name, order));
        self.native_order.push(field);
    }

    fn map_base(&mut self, f: impl FnOnce(SelectQuery) -> SelectQuery) {
        let base = std::mem::take(&mut self.base);
        self.base = f(base);
    }
}
