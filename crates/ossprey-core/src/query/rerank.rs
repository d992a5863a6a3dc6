//! Two-stage embedding retrieval with heuristic reranking.
//!
//! 1. Shortlist: cosine similarity of the low-dimensional query vector against
//!    every document of the target project; keep the top `M`.
//! 2. Rerank: cosine similarity of the full-precision vectors for those `M`.
//! 3. Adjust: apply [`score_adjustment`] and sort by adjusted score (desc),
//!    precise similarity (desc), then corpus order.
//!
//! The shortlist bounds the cost of the precise stage to `M` documents
//! rather than the whole corpus.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{OsspreyError, OsspreyResult};
use crate::models::DocumentRecord;
use crate::query::guards::{clamp_limit, DEFAULT_SHORTLIST_SIZE, MAX_SHORTLIST_SIZE};
use crate::query::heuristics::{adjusted_score, score_adjustment, AdjustmentWeights, ScoreAdjustment};
use crate::query::tokenizer::estimate_tokens;
use crate::query::vectors::{all_finite, cosine_similarity, slice_and_normalize};

// ---------------------------------------------------------------------------
// Query vectors
// ---------------------------------------------------------------------------

/// The query's embedding at both precisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryVectors {
    pub shortlist: Vec<f32>,
    pub rerank: Vec<f32>,
}

impl QueryVectors {
    pub fn new(shortlist: Vec<f32>, rerank: Vec<f32>) -> Self {
        Self { shortlist, rerank }
    }

    /// Derive the shortlist vector as the normalized prefix of `full`.
    pub fn from_full(full: Vec<f32>, shortlist_dims: usize) -> Self {
        Self {
            shortlist: slice_and_normalize(&full, shortlist_dims),
            rerank: full,
        }
    }

    /// Check the vectors can be scored against a corpus of `dimensions`
    /// (`(shortlist, rerank)`): lengths must match and every component must
    /// be finite.
    pub fn check_against(&self, dimensions: (usize, usize)) -> OsspreyResult<()> {
        let (shortlist_dims, rerank_dims) = dimensions;
        if self.shortlist.len() != shortlist_dims || self.rerank.len() != rerank_dims {
            return Err(OsspreyError::Embedding(format!(
                "query vectors have dimensions {}/{}, corpus expects {}/{}",
                self.shortlist.len(),
                self.rerank.len(),
                shortlist_dims,
                rerank_dims
            )));
        }
        if !all_finite(&self.shortlist) || !all_finite(&self.rerank) {
            return Err(OsspreyError::Embedding(
                "query vectors contain a non-finite component".to_string(),
            ));
        }
        Ok(())
    }
}

/// Produces query embeddings for the governance path.
///
/// The router only calls this when the query was classified GOVERNANCE.
pub trait QueryEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> OsspreyResult<QueryVectors>;
}

/// Precomputed vectors embed every query to themselves.
impl QueryEmbedder for QueryVectors {
    fn embed(&self, _text: &str) -> OsspreyResult<QueryVectors> {
        Ok(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Parameters and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankParams {
    /// Shortlist size `M`.
    pub shortlist_size: usize,
    pub weights: AdjustmentWeights,
}

impl Default for RerankParams {
    fn default() -> Self {
        Self {
            shortlist_size: DEFAULT_SHORTLIST_SIZE,
            weights: AdjustmentWeights::default(),
        }
    }
}

/// A document scored by the reranker. Borrowed from the corpus; never stored.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub document: &'a DocumentRecord,
    pub corpus_index: usize,
    pub shortlist_similarity: f64,
    /// Precise (rerank-stage) similarity before adjustment.
    pub similarity: f64,
    pub adjustment: ScoreAdjustment,
    pub adjusted_score: f64,
}

/// Owned evidence item handed to the synthesis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub document_id: String,
    pub text: String,
    pub source_path: String,
    pub project_id: String,
    pub adjusted_score: f64,
    pub similarity: f64,
    pub adjustment: ScoreAdjustment,
    pub estimated_tokens: usize,
}

impl From<&ScoredCandidate<'_>> for Evidence {
    fn from(candidate: &ScoredCandidate<'_>) -> Self {
        let doc = candidate.document;
        Evidence {
            document_id: doc.id.clone(),
            text: doc.text.clone(),
            source_path: doc.metadata.source_path.clone(),
            project_id: doc.metadata.project_id.clone(),
            adjusted_score: candidate.adjusted_score,
            similarity: candidate.similarity,
            adjustment: candidate.adjustment,
            estimated_tokens: estimate_tokens(&doc.text),
        }
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Stage 1: `(corpus_index, similarity)` for the top `size` documents of
/// `project_id`, best first, ties by corpus order.
pub fn shortlist(
    query: &[f32],
    documents: &[DocumentRecord],
    project_id: &str,
    size: usize,
) -> Vec<(usize, f64)> {
    if size == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(usize, f64)> = documents
        .par_iter()
        .enumerate()
        .filter(|(_, doc)| doc.metadata.project_id == project_id)
        .map(|(idx, doc)| (idx, cosine_similarity(query, &doc.shortlist_embedding)))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(size);
    scored
}

/// Run both stages and the heuristic adjustment; return at most `k`
/// candidates in final order. Never fails: an empty or foreign corpus yields
/// an empty list, a corpus smaller than `k` yields every document.
pub fn rerank<'a>(
    query: &QueryVectors,
    documents: &'a [DocumentRecord],
    project_id: &str,
    k: usize,
    params: &RerankParams,
) -> Vec<ScoredCandidate<'a>> {
    if k == 0 || documents.is_empty() {
        return Vec::new();
    }

    let shortlist_size = clamp_limit(params.shortlist_size, MAX_SHORTLIST_SIZE).max(k);
    let stage_one = shortlist(&query.shortlist, documents, project_id, shortlist_size);

    let mut candidates: Vec<ScoredCandidate<'a>> = stage_one
        .into_iter()
        .map(|(idx, shortlist_similarity)| {
            let document = &documents[idx];
            let similarity = cosine_similarity(&query.rerank, &document.rerank_embedding);
            let adjustment = score_adjustment(&document.text, &params.weights);
            ScoredCandidate {
                document,
                corpus_index: idx,
                shortlist_similarity,
                similarity,
                adjustment,
                adjusted_score: adjusted_score(similarity, &adjustment),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.adjusted_score
            .total_cmp(&a.adjusted_score)
            .then(b.similarity.total_cmp(&a.similarity))
            .then(a.corpus_index.cmp(&b.corpus_index))
    });

    debug!(
        "Reranked {} shortlisted of {} documents for project {}",
        candidates.len(),
        documents.len(),
        project_id
    );

    candidates.truncate(k);
    candidates
}
