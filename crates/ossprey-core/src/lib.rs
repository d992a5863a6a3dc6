//! Ossprey core library: query routing and retrieval for the OSS governance
//! assistant.
//!
//! A question about an open-source project is classified into an intent,
//! then answered from the matching per-project data source: reranked
//! governance documents, or a canonical aggregation over the commits or
//! issues table. Nothing here calls a model; evidence is handed back to the
//! caller for synthesis.
//!
//! With the `python` feature the crate builds the `_ossprey_core` extension
//! module used by the Python request layer.

pub mod config;
pub mod errors;
pub mod models;
pub mod query;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use config::EngineConfig;
pub use errors::{OsspreyError, OsspreyResult};
pub use models::{DataSource, Intent, IntentResult, Query};
pub use query::rerank::{QueryEmbedder, QueryVectors};
pub use query::router::{RouteOptions, RouteOutcome, RoutedQuery, Router};
pub use store::snapshot::SnapshotRegistry;

#[cfg(feature = "python")]
use pyo3::prelude::*;

// ---------------------------------------------------------------------------
// Top-level Python module: _ossprey_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pymodule]
fn _ossprey_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)
}
