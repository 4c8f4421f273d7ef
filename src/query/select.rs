//! Base SELECT builder.
//!
//! `SelectQuery` accumulates joins, WHERE conditions and ORDER BY clauses on a
//! `sea_query::SelectStatement` and renders it. It treats every name as a native
//! column of its table; dynamic attributes are handled one layer up, in
//! [`Relation`](crate::query::Relation), which composes over this builder.

use crate::query::join::JoinKind;
use crate::query::{non_null, Ident};
use sea_query::{
    Asterisk, Condition, Expr, ExprTrait, IntoColumnRef, IntoCondition, Order, QueryBuilder,
    SelectStatement, Value, Values,
};

/// Query builder for selecting rows of one table
///
/// # Example
///
/// ```
/// use hydraguard::SelectQuery;
/// use sea_query::{Order, PostgresQueryBuilder, Value};
///
/// let sql = SelectQuery::new("products")
///     .filter_column("title", Some(Value::from("Lamp")))
///     .order_by_column("id", Order::Desc)
///     .limit(10)
///     .to_string(PostgresQueryBuilder);
///
/// assert_eq!(
///     sql,
///     r#"SELECT "products".* FROM "products" WHERE "products"."title" = 'Lamp' ORDER BY "products"."id" DESC LIMIT 10"#
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub(crate) query: SelectStatement,
    table: String,
}

impl SelectQuery {
    /// Create a new select query over `table`, selecting `table.*`
    ///
    /// Columns are table-qualified so that joined value tables never leak
    /// their own `name`/`value` columns into the result set.
    pub fn new(table: &str) -> Self {
        let mut query = SelectStatement::default();
        query
            .column((Ident::new(table), Asterisk))
            .from(Ident::new(table));
        Self {
            query,
            table: table.to_string(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Add a filter condition
    ///
    /// Accepts anything implementing `IntoCondition` (`Expr`, `Condition`, ...).
    pub fn filter<F>(mut self, condition: F) -> Self
    where
        F: IntoCondition,
    {
        self.query.cond_where(condition.into_condition());
        self
    }

    /// Native equality filter on a column of this table; `None` or a typed null
    /// filters with `IS NULL`
    pub fn filter_column(self, column: &str, value: Option<Value>) -> Self {
        let target = Expr::col((Ident::new(&self.table), Ident::new(column)));
        let condition = match non_null(value) {
            Some(value) => target.eq(value),
            None => target.is_null(),
        };
        self.filter(condition)
    }

    /// Add an ORDER BY clause on any column reference
    pub fn order_by<C: IntoColumnRef>(mut self, column: C, order: Order) -> Self {
        self.query.order_by(column, order);
        self
    }

    /// Add an ORDER BY clause on a column of this table
    pub fn order_by_column(self, column: &str, order: Order) -> Self {
        let table = Ident::new(&self.table);
        self.order_by((table, Ident::new(column)), order)
    }

    /// Drop every ORDER BY clause
    pub fn clear_order(mut self) -> Self {
        self.query.clear_order_by();
        self
    }

    /// Join `table` under `alias`
    pub fn join_as(mut self, kind: JoinKind, table: &str, alias: &str, on: Condition) -> Self {
        self.query
            .join_as(kind.sql_join_type(), Ident::new(table), Ident::new(alias), on);
        self
    }

    /// Add a LIMIT clause
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit(limit);
        self
    }

    /// Add an OFFSET clause
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset(offset);
        self
    }

    /// Render SQL with placeholders plus the values to bind
    pub fn build<T: QueryBuilder>(&self, builder: T) -> (String, Values) {
        self.query.build(builder)
    }

    /// Render SQL with values inlined (logging and tests)
    pub fn to_string<T: QueryBuilder>(&self, builder: T) -> String {
        self.query.to_string(builder)
    }
}
