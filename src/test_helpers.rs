//! Test support: an executor that records every query and answers from scripted rows.
//!
//! Compiled for the crate's own unit tests, and for downstream test suites with the
//! `test-helpers` feature.

use crate::error::{HydraError, HydraResult};
use crate::executor::HydraExecutor;
use crate::row::Row;
use sea_query::Values;
use std::sync::{Arc, Mutex, PoisonError};

enum Response {
    Rows(Vec<Row>),
    Fail(String),
}

/// Mock executor that captures SQL and values for verification
///
/// Responses are matched in registration order: the first rule whose fragment
/// occurs in the SQL answers it. Unmatched queries return no rows.
#[derive(Clone, Default)]
pub struct MockExecutor {
    captured: Arc<Mutex<Vec<(String, Values)>>>,
    rules: Arc<Mutex<Vec<(String, Response)>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `fragment` with `rows`
    pub fn respond_to(self, fragment: impl Into<String>, rows: Vec<Row>) -> Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((fragment.into(), Response::Rows(rows)));
        self
    }

    /// Fail queries containing `fragment` with a persistence error
    pub fn fail_on(self, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((fragment.into(), Response::Fail(message.into())));
        self
    }

    pub fn captured_sql(&self) -> Vec<String> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub fn captured_values(&self) -> Vec<Values> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, values)| values.clone())
            .collect()
    }

    /// Number of captured queries containing `fragment`
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.captured_sql()
            .iter()
            .filter(|sql| sql.contains(fragment))
            .count()
    }

    pub fn clear(&self) {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl HydraExecutor for MockExecutor {
    fn query_all(&self, sql: &str, values: &Values) -> HydraResult<Vec<Row>> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((sql.to_string(), values.clone()));

        let rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        match rules.iter().find(|(fragment, _)| sql.contains(fragment.as_str())) {
            Some((_, Response::Rows(rows))) => Ok(rows.clone()),
            Some((_, Response::Fail(message))) => Err(HydraError::Persistence(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}
