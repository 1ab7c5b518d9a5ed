//! Batch results: successes plus per-item failures
//!
//! One semantic model or one metric failing never aborts a run; the failure
//! is recorded here and processing moves on.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of item a batch processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    SemanticModel,
    Metric,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::SemanticModel => write!(f, "semantic model"),
            ItemKind::Metric => write!(f, "metric"),
        }
    }
}

/// An item left out of the payload because its mapping failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub kind: ItemKind,
    pub name: String,
    /// Error category, e.g. `mapping`
    pub category: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(kind: ItemKind, name: impl Into<String>, error: &Error) -> Self {
        let reason = match error {
            Error::Mapping { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            kind,
            name: name.into(),
            category: error.category().to_string(),
            reason,
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.kind, self.name, self.reason)
    }
}

/// Outcome of processing a list of items
#[derive(Debug, Clone)]
pub struct Batch<T> {
    kind: ItemKind,
    successes: Vec<T>,
    failures: Vec<ItemFailure>,
}

impl<T> Batch<T> {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Record the result of one item
    pub fn record(&mut self, name: &str, result: Result<T, Error>) -> Option<&T> {
        match result {
            Ok(value) => {
                self.successes.push(value);
                self.successes.last()
            }
            Err(error) => {
                tracing::warn!(kind = %self.kind, name = name, error = %error, "Item skipped after failure");
                self.failures.push(ItemFailure::new(self.kind, name, &error));
                None
            }
        }
    }

    pub fn successes(&self) -> &[T] {
        &self.successes
    }

    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<ItemFailure>) {
        (self.successes, self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_keeps_successes_and_failures() {
        let mut batch: Batch<u32> = Batch::new(ItemKind::Metric);
        assert_eq!(batch.record("one", Ok(1)), Some(&1));
        assert_eq!(batch.record("two", Err(Error::mapping_for("two", "unresolved measure"))), None);
        batch.record("three", Ok(3));

        assert_eq!(batch.successes(), &[1, 3]);
        assert_eq!(batch.failures().len(), 1);
        assert_eq!(batch.failures()[0].name, "two");
        assert_eq!(batch.failures()[0].category, "mapping");
        assert_eq!(batch.failures()[0].to_string(), "metric 'two': unresolved measure");
    }
}
