//! PyO3 bindings for the `_ossprey_core` extension module.
//!
//! Results cross the boundary as JSON and are decoded with `json.loads`, so
//! Python callers receive plain dicts and lists.

use std::sync::Arc;

use pyo3::prelude::*;
use pyo3::wrap_pyfunction;
use serde::Serialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::errors::{OsspreyError, OsspreyResult};
use crate::models::Query;
use crate::query::intent::classify_intent;
use crate::query::rerank::{QueryEmbedder, QueryVectors};
use crate::query::router::{RouteOptions, Router};
use crate::store::corpus::Corpus;
use crate::store::dataset::{CommitDataset, IssueDataset};
use crate::store::snapshot::SnapshotRegistry;

fn to_py<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    let json_str = serde_json::to_string(value).map_err(OsspreyError::from)?;
    let json_module = py.import("json")?;
    json_module
        .call_method1("loads", (json_str,))
        .map(|o| o.into())
}

fn parse_records(records_json: &str) -> OsspreyResult<Vec<Value>> {
    match serde_json::from_str::<Value>(records_json)? {
        Value::Array(records) => Ok(records),
        _ => Err(OsspreyError::InvalidDataset {
            row: 0,
            reason: "expected a JSON array of records".to_string(),
        }),
    }
}

/// Embeds through a Python callable `text -> list[float]` returning the full
/// vector; the shortlist vector is its normalized prefix.
struct PyCallableEmbedder {
    callable: Py<PyAny>,
    shortlist_dims: usize,
}

impl QueryEmbedder for PyCallableEmbedder {
    fn embed(&self, text: &str) -> OsspreyResult<QueryVectors> {
        Python::with_gil(|py| {
            let full: Vec<f32> = self
                .callable
                .call1(py, (text,))
                .and_then(|result| result.extract(py))
                .map_err(|err| OsspreyError::Embedding(err.to_string()))?;
            Ok(QueryVectors::from_full(full, self.shortlist_dims))
        })
    }
}

/// Used when the caller supplied no embedder; only GOVERNANCE routes need one.
struct NoEmbedder;

impl QueryEmbedder for NoEmbedder {
    fn embed(&self, _text: &str) -> OsspreyResult<QueryVectors> {
        Err(OsspreyError::Embedding(
            "governance queries require an embed callable".to_string(),
        ))
    }
}

#[pyclass(name = "Engine")]
pub struct PyEngine {
    router: Router,
}

#[pymethods]
impl PyEngine {
    #[new]
    #[pyo3(signature = (use_env=true))]
    fn new(use_env: bool) -> PyResult<Self> {
        let config = if use_env {
            EngineConfig::from_env()?
        } else {
            EngineConfig::default()
        };
        Ok(Self {
            router: Router::new(Arc::new(SnapshotRegistry::new()), config),
        })
    }

    /// Replace the project's corpus from a JSON array of document records.
    fn load_corpus(&self, project_id: &str, records_json: &str) -> PyResult<u64> {
        let corpus = Corpus::from_records(project_id, parse_records(records_json)?)?;
        Ok(self.router.registry().replace_corpus(corpus))
    }

    fn load_commits(&self, project_id: &str, rows_json: &str) -> PyResult<u64> {
        let dataset = CommitDataset::from_json_str(rows_json)?;
        Ok(self.router.registry().replace_commits(project_id, dataset))
    }

    fn load_issues(&self, project_id: &str, rows_json: &str) -> PyResult<u64> {
        let dataset = IssueDataset::from_json_str(rows_json)?;
        Ok(self.router.registry().replace_issues(project_id, dataset))
    }

    fn remove_project(&self, project_id: &str) -> bool {
        self.router.registry().remove_project(project_id)
    }

    #[pyo3(signature = (query, project_id, embed=None, k=None, limit=None))]
    fn route(
        &self,
        py: Python<'_>,
        query: &str,
        project_id: &str,
        embed: Option<Py<PyAny>>,
        k: Option<usize>,
        limit: Option<usize>,
    ) -> PyResult<PyObject> {
        let query = Query::new(query, project_id);
        let options = RouteOptions { k, limit };
        let routed = match embed {
            Some(callable) => {
                let shortlist_dims = self
                    .router
                    .registry()
                    .snapshot(project_id)
                    .and_then(|snap| snap.corpus.as_ref().map(|c| c.dimensions().0))
                    .unwrap_or(0);
                let embedder = PyCallableEmbedder {
                    callable,
                    shortlist_dims,
                };
                self.router.route_with(&query, &embedder, options)?
            }
            None => self.router.route_with(&query, &NoEmbedder, options)?,
        };
        to_py(py, &routed)
    }

    fn classify(&self, py: Python<'_>, query: &str) -> PyResult<PyObject> {
        to_py(py, &self.router.classify(query))
    }

    fn available_data(&self, py: Python<'_>, project_id: &str) -> PyResult<PyObject> {
        to_py(py, &self.router.registry().available_data(project_id))
    }

    fn project_ids(&self) -> Vec<String> {
        self.router.registry().project_ids()
    }

    fn stats(&self, py: Python<'_>) -> PyResult<PyObject> {
        let payload = serde_json::json!({
            "registry": self.router.registry().stats(),
            "planner": self.router.planner_stats(),
            "config": self.router.config(),
        });
        to_py(py, &payload)
    }

    fn clear_cache(&self) {
        self.router.clear_cache();
    }
}

/// Classify with the built-in lexicons and no engine state.
#[pyfunction]
#[pyo3(name = "classify_intent")]
fn py_classify_intent(py: Python<'_>, query: &str) -> PyResult<PyObject> {
    to_py(py, &classify_intent(query))
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // -- Engine -------------------------------------------------------------
    m.add_class::<PyEngine>()?;
    m.add_function(wrap_pyfunction!(py_classify_intent, m)?)?;

    // -- Guards -------------------------------------------------------------
    m.add("MAX_QUERY_LENGTH", crate::query::guards::MAX_QUERY_LENGTH)?;
    m.add("MAX_RESULT_LIMIT", crate::query::guards::MAX_RESULT_LIMIT)?;
    m.add("MAX_RETRIEVAL_K", crate::query::guards::MAX_RETRIEVAL_K)?;
    m.add("MAX_SHORTLIST_SIZE", crate::query::guards::MAX_SHORTLIST_SIZE)?;
    m.add_function(wrap_pyfunction!(crate::query::guards::clamp_int, m)?)?;
    m.add_function(wrap_pyfunction!(crate::query::guards::clamp_limit, m)?)?;
    m.add_function(wrap_pyfunction!(crate::query::guards::truncate_query, m)?)?;
    m.add_function(wrap_pyfunction!(crate::query::guards::normalize_query, m)?)?;

    // -- Tokenizer ----------------------------------------------------------
    m.add_function(wrap_pyfunction!(crate::query::tokenizer::estimate_tokens, m)?)?;

    Ok(())
}
