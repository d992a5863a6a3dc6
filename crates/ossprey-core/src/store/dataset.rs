//! Per-project tabular datasets (commits, issues).

use serde_json::Value;

use crate::errors::{OsspreyError, OsspreyResult};
use crate::models::{CommitRow, DatasetKind, IssueRow};
use crate::query::tabular::TabularRecord;

/// An immutable table of rows. Replaced wholesale on reload, never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset<R> {
    rows: Vec<R>,
}

pub type CommitDataset = TabularDataset<CommitRow>;
pub type IssueDataset = TabularDataset<IssueRow>;

impl<R: TabularRecord> TabularDataset<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    /// Deserialize every record; the first record violating the column
    /// contract rejects the whole load.
    pub fn from_records(records: Vec<Value>) -> OsspreyResult<Self> {
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(row, record)| {
                serde_json::from_value::<R>(record).map_err(|err| OsspreyError::InvalidDataset {
                    row,
                    reason: err.to_string(),
                })
            })
            .collect::<OsspreyResult<Vec<R>>>()?;
        Ok(Self { rows })
    }

    /// Parse a JSON array of row objects.
    pub fn from_json_str(text: &str) -> OsspreyResult<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Array(records) => Self::from_records(records),
            other => Err(OsspreyError::InvalidDataset {
                row: 0,
                reason: format!("expected a JSON array of rows, found {}", json_kind(&other)),
            }),
        }
    }

    pub fn kind(&self) -> DatasetKind {
        R::KIND
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
