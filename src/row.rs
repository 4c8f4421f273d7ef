//! Result rows handed back by a [`HydraExecutor`](crate::executor::HydraExecutor).

use crate::entity::EntityDef;
use crate::error::HydraResult;
use sea_query::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column names shared by every row of one result set
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row returned from a query
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    pub fn new(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Build a standalone row from `(column, value)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(name, value)| (name.into(), value)).unzip();
        Self::new(Arc::new(ColumnInfo::new(names)), values)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        self.columns.names()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(column, value)` pairs in select order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Map a result row of `entity`'s table to a model
pub trait FromRow: Sized {
    fn from_row(entity: &EntityDef, row: &Row) -> HydraResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_by_name_and_index() {
        let row = Row::from_pairs([
            ("id", Value::from(7i64)),
            ("title", Value::from("Lamp")),
        ]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&Value::from(7i64)));
        assert_eq!(row.get_index(1), Some(&Value::from("Lamp")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.columns(), &["id".to_string(), "title".to_string()]);
    }

    #[test]
    fn test_rows_share_column_info() {
        let columns = Arc::new(ColumnInfo::new(vec!["id".into()]));
        let a = Row::new(Arc::clone(&columns), vec![Value::from(1i32)]);
        let b = Row::new(Arc::clone(&columns), vec![Value::from(2i32)]);
        assert_eq!(Arc::strong_count(&columns), 3);
        assert_ne!(a.get("id"), b.get("id"));
    }
}
