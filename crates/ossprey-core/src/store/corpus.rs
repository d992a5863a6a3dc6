//! Per-project document corpus.

use std::collections::HashSet;

use serde_json::Value;

use crate::errors::{OsspreyError, OsspreyResult};
use crate::models::DocumentRecord;
use crate::query::vectors::all_finite;

/// Validated, read-only set of embedded chunks for one project.
///
/// All documents share one shortlist dimension and one rerank dimension and
/// belong to `project_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    project_id: String,
    documents: Vec<DocumentRecord>,
    shortlist_dims: usize,
    rerank_dims: usize,
}

impl Corpus {
    pub fn new(project_id: impl Into<String>, documents: Vec<DocumentRecord>) -> OsspreyResult<Self> {
        let project_id = project_id.into();
        let mut seen: HashSet<&str> = HashSet::new();
        let (mut shortlist_dims, mut rerank_dims) = (0usize, 0usize);

        for (idx, doc) in documents.iter().enumerate() {
            if doc.metadata.project_id != project_id {
                return Err(OsspreyError::InvalidCorpus(format!(
                    "document '{}' belongs to project '{}', expected '{}'",
                    doc.id, doc.metadata.project_id, project_id
                )));
            }
            if !seen.insert(doc.id.as_str()) {
                return Err(OsspreyError::InvalidCorpus(format!(
                    "duplicate document id '{}'",
                    doc.id
                )));
            }
            if doc.shortlist_embedding.is_empty() || doc.rerank_embedding.is_empty() {
                return Err(OsspreyError::InvalidCorpus(format!(
                    "document '{}' has an empty embedding",
                    doc.id
                )));
            }
            if !all_finite(&doc.shortlist_embedding) || !all_finite(&doc.rerank_embedding) {
                return Err(OsspreyError::InvalidCorpus(format!(
                    "document '{}' has a non-finite embedding component",
                    doc.id
                )));
            }
            if idx == 0 {
                shortlist_dims = doc.shortlist_embedding.len();
                rerank_dims = doc.rerank_embedding.len();
            } else if doc.shortlist_embedding.len() != shortlist_dims
                || doc.rerank_embedding.len() != rerank_dims
            {
                return Err(OsspreyError::InvalidCorpus(format!(
                    "document '{}' has dimensions {}/{}, expected {}/{}",
                    doc.id,
                    doc.shortlist_embedding.len(),
                    doc.rerank_embedding.len(),
                    shortlist_dims,
                    rerank_dims
                )));
            }
        }

        Ok(Self {
            project_id,
            documents,
            shortlist_dims,
            rerank_dims,
        })
    }

    /// Parse a JSON array of document records.
    pub fn from_records(project_id: impl Into<String>, records: Vec<Value>) -> OsspreyResult<Self> {
        let documents = records
            .into_iter()
            .enumerate()
            .map(|(row, record)| {
                serde_json::from_value::<DocumentRecord>(record).map_err(|err| {
                    OsspreyError::InvalidCorpus(format!("record {row}: {err}"))
                })
            })
            .collect::<OsspreyResult<Vec<_>>>()?;
        Self::new(project_id, documents)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// `(shortlist, rerank)` dimensions; `(0, 0)` for an empty corpus.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.shortlist_dims, self.rerank_dims)
    }
}
