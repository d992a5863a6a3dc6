//! Query routing: classify, resolve the project's snapshot, then run the
//! reranker or the tabular dispatcher.
//!
//! Every path that cannot ground an answer returns an explicit
//! [`RouteOutcome::InsufficientData`] or [`RouteOutcome::NoRetrieval`];
//! a project lacking the data source its intent needs is an
//! [`OsspreyError::MissingDataset`].

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::errors::{OsspreyError, OsspreyResult};
use crate::models::{DataSource, DatasetKind, Intent, IntentResult, Query};
use crate::query::guards::{clamp_limit, normalize_query, MAX_RETRIEVAL_K};
use crate::query::intent::IntentClassifier;
use crate::query::planner::{
    bypass_trace, cache_key, PlannerStats, PlannerTrace, QueryPlanner,
};
use crate::query::rerank::{rerank, Evidence, QueryEmbedder};
use crate::query::rules::CanonicalQueryType;
use crate::query::tabular::{dispatch, DispatchOutcome, TabularAnswer, TabularRecord};
use crate::store::dataset::TabularDataset;
use crate::store::snapshot::{ProjectSnapshot, SnapshotRegistry};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a correctly routed query produced nothing to ground an answer on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsufficientReason {
    NoMatchingQueryType,
    EmptyResult {
        rule: &'static str,
        query_type: CanonicalQueryType,
    },
    EmptyCorpus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Ordered evidence for the synthesis collaborator (GOVERNANCE).
    Evidence { items: Vec<Evidence> },
    /// Rows and summary from the tabular dispatcher (COMMITS/ISSUES).
    Tabular(TabularAnswer),
    InsufficientData {
        data_source: DataSource,
        reason: InsufficientReason,
    },
    /// GENERAL: no data source was consulted.
    NoRetrieval,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedQuery {
    pub project_id: String,
    pub intent: IntentResult,
    pub outcome: RouteOutcome,
    /// Snapshot version the outcome was computed against; 0 when none was read.
    pub snapshot_version: u64,
    pub trace: PlannerTrace,
}

/// Per-request overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Evidence items for GOVERNANCE; defaults to the configured `k`.
    pub k: Option<usize>,
    /// Row limit `N` for tabular queries; defaults to the rule's own.
    pub limit: Option<usize>,
}

fn insufficient_from_dispatch(outcome: DispatchOutcome, data_source: DataSource) -> RouteOutcome {
    match outcome {
        DispatchOutcome::Resolved(answer) => RouteOutcome::Tabular(answer),
        DispatchOutcome::NoMatchingQueryType => RouteOutcome::InsufficientData {
            data_source,
            reason: InsufficientReason::NoMatchingQueryType,
        },
        DispatchOutcome::EmptyResult { rule, query_type } => RouteOutcome::InsufficientData {
            data_source,
            reason: InsufficientReason::EmptyResult { rule, query_type },
        },
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    classifier: IntentClassifier,
    registry: Arc<SnapshotRegistry>,
    config: EngineConfig,
    planner: QueryPlanner<DispatchOutcome>,
}

impl Router {
    pub fn new(registry: Arc<SnapshotRegistry>, config: EngineConfig) -> Self {
        let config = config.clamped();
        Self {
            classifier: IntentClassifier::default(),
            registry,
            planner: QueryPlanner::new(config.cache_max_entries, config.cache_ttl_seconds),
            config,
        }
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn registry(&self) -> &Arc<SnapshotRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classify(&self, text: &str) -> IntentResult {
        self.classifier.classify(text)
    }

    pub fn planner_stats(&self) -> PlannerStats {
        self.planner.stats()
    }

    pub fn clear_cache(&self) {
        self.planner.clear();
    }

    fn snapshot_for(&self, project_id: &str, data_source: DataSource) -> OsspreyResult<Arc<ProjectSnapshot>> {
        self.registry
            .snapshot(project_id)
            .ok_or_else(|| OsspreyError::missing(project_id, data_source))
    }

    pub fn route(&self, query: &Query, embedder: &dyn QueryEmbedder) -> OsspreyResult<RoutedQuery> {
        self.route_with(query, embedder, RouteOptions::default())
    }

    pub fn route_with(
        &self,
        query: &Query,
        embedder: &dyn QueryEmbedder,
        options: RouteOptions,
    ) -> OsspreyResult<RoutedQuery> {
        let intent = self.classifier.classify(&query.text);
        let project_id = query.project_id.as_str();

        let (outcome, snapshot_version, trace) = match intent.intent {
            Intent::General => {
                let (outcome, trace) = bypass_trace("none", || RouteOutcome::NoRetrieval);
                (outcome, 0, trace)
            }
            Intent::Governance => self.route_governance(query, embedder, options.k)?,
            Intent::Commits => self.route_tabular(
                project_id,
                &query.text,
                DatasetKind::Commits,
                options.limit,
                |snap| snap.commits.clone(),
            )?,
            Intent::Issues => self.route_tabular(
                project_id,
                &query.text,
                DatasetKind::Issues,
                options.limit,
                |snap| snap.issues.clone(),
            )?,
        };

        info!(
            "Routed query for {} -> {} ({}, {:.3} ms)",
            project_id,
            intent.intent,
            trace.mode.as_str(),
            trace.total_ms
        );

        Ok(RoutedQuery {
            project_id: project_id.to_string(),
            intent,
            outcome,
            snapshot_version,
            trace,
        })
    }

    fn route_governance(
        &self,
        query: &Query,
        embedder: &dyn QueryEmbedder,
        k: Option<usize>,
    ) -> OsspreyResult<(RouteOutcome, u64, PlannerTrace)> {
        let project_id = query.project_id.as_str();
        let snapshot = self.snapshot_for(project_id, DataSource::DocumentCorpus)?;
        let corpus = snapshot
            .corpus
            .clone()
            .ok_or_else(|| OsspreyError::missing(project_id, DataSource::DocumentCorpus))?;
        let version_token = snapshot.version.to_string();

        if corpus.is_empty() {
            let (outcome, trace) = bypass_trace(&version_token, || RouteOutcome::InsufficientData {
                data_source: DataSource::DocumentCorpus,
                reason: InsufficientReason::EmptyCorpus,
            });
            return Ok((outcome, snapshot.version, trace));
        }

        let started = Instant::now();
        let vectors = embedder.embed(&query.text)?;
        vectors.check_against(corpus.dimensions())?;
        debug!(
            "Embedded query in {:.3} ms",
            started.elapsed().as_secs_f64() * 1000.0
        );

        let k = clamp_limit(k.unwrap_or(self.config.default_k), MAX_RETRIEVAL_K);
        let params = self.config.rerank_params();
        let (items, trace) = bypass_trace(&version_token, || {
            rerank(&vectors, corpus.documents(), project_id, k, &params)
                .iter()
                .map(Evidence::from)
                .collect::<Vec<Evidence>>()
        });

        let outcome = if items.is_empty() {
            RouteOutcome::InsufficientData {
                data_source: DataSource::DocumentCorpus,
                reason: InsufficientReason::EmptyCorpus,
            }
        } else {
            RouteOutcome::Evidence { items }
        };
        Ok((outcome, snapshot.version, trace))
    }

    fn route_tabular<R: TabularRecord>(
        &self,
        project_id: &str,
        text: &str,
        kind: DatasetKind,
        limit: Option<usize>,
        select: impl Fn(&ProjectSnapshot) -> Option<Arc<TabularDataset<R>>>,
    ) -> OsspreyResult<(RouteOutcome, u64, PlannerTrace)> {
        let data_source = kind.data_source();
        let snapshot = self.snapshot_for(project_id, data_source)?;
        let dataset = select(&snapshot).ok_or_else(|| OsspreyError::missing(project_id, data_source))?;

        let normalized = normalize_query(text);
        let version_token = snapshot.version.to_string();
        let compute = || dispatch(&normalized, dataset.rows(), limit);

        let (dispatched, trace) = if self.config.query_cache {
            let key = cache_key(
                project_id,
                &format!("{kind:?}|{limit:?}|{normalized}"),
                &version_token,
            );
            match self
                .planner
                .get_or_compute(&key, &version_token, || Ok::<_, Infallible>(compute()))
            {
                Ok(hit) => hit,
                Err(never) => match never {},
            }
        } else {
            bypass_trace(&version_token, compute)
        };

        Ok((
            insufficient_from_dispatch(dispatched, data_source),
            snapshot.version,
            trace,
        ))
    }

    /// Reranked evidence for `text`, bypassing the classifier.
    pub fn retrieve(
        &self,
        project_id: &str,
        embedder: &dyn QueryEmbedder,
        text: &str,
        k: Option<usize>,
    ) -> OsspreyResult<Vec<Evidence>> {
        let query = Query::new(text, project_id);
        match self.route_governance(&query, embedder, k)?.0 {
            RouteOutcome::Evidence { items } => Ok(items),
            _ => Ok(Vec::new()),
        }
    }

    /// Tabular dispatch bypassing the classifier and the cache.
    pub fn dispatch_tabular(
        &self,
        project_id: &str,
        kind: DatasetKind,
        text: &str,
        limit: Option<usize>,
    ) -> OsspreyResult<DispatchOutcome> {
        let data_source = kind.data_source();
        let snapshot = self.snapshot_for(project_id, data_source)?;
        let normalized = normalize_query(text);
        match kind {
            DatasetKind::Commits => snapshot
                .commits
                .as_ref()
                .map(|d| dispatch(&normalized, d.rows(), limit)),
            DatasetKind::Issues => snapshot
                .issues
                .as_ref()
                .map(|d| dispatch(&normalized, d.rows(), limit)),
        }
        .ok_or_else(|| OsspreyError::missing(project_id, data_source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommitRow, DocumentMetadata, DocumentRecord, IssueRow};
    use crate::query::planner::CacheMode;
    use crate::query::rerank::QueryVectors;
    use crate::store::corpus::Corpus;
    use crate::store::dataset::{CommitDataset, IssueDataset};
    use chrono::{TimeZone, Utc};

    struct FailingEmbedder;

    impl QueryEmbedder for FailingEmbedder {
        fn embed(&self, _text: &str) -> OsspreyResult<QueryVectors> {
            Err(OsspreyError::Embedding("model unavailable".to_string()))
        }
    }

    fn issue(number: i64, state: &str, updated: u32) -> IssueRow {
        IssueRow {
            number,
            title: format!("Issue {number}"),
            reporter: "octo".to_string(),
            state: state.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 2, updated, 0, 0, 0).unwrap(),
            comment_count: 0,
        }
    }

    fn commit(author: &str, day: u32) -> CommitRow {
        CommitRow {
            commit_sha: Some(format!("{author}{day}")),
            author: author.to_string(),
            author_email: None,
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            file_path: "src/lib.rs".to_string(),
            lines_added: 1,
            lines_deleted: 0,
            message: None,
        }
    }

    fn doc(id: &str, text: &str, vector: Vec<f32>) -> DocumentRecord {
        DocumentRecord::from_full_embedding(
            id,
            text,
            vector,
            2,
            DocumentMetadata {
                source_path: format!("{id}.md"),
                project_id: "keras-io".to_string(),
            },
        )
    }

    fn query_vectors() -> QueryVectors {
        QueryVectors::from_full(vec![1.0, 0.0, 0.0, 0.0], 2)
    }

    fn router() -> Router {
        let registry = Arc::new(SnapshotRegistry::new());
        registry.replace_issues(
            "keras-io",
            IssueDataset::new(vec![
                issue(1, "open", 1),
                issue(2, "OPEN", 5),
                issue(3, "closed", 9),
                issue(4, "open", 3),
            ]),
        );
        registry.replace_commits(
            "keras-io",
            CommitDataset::new(vec![commit("ada", 1), commit("grace", 2), commit("ada", 3)]),
        );
        registry.replace_corpus(
            Corpus::new(
                "keras-io",
                vec![
                    doc("license", "Licensed under the Apache License 2.0.", vec![0.1, 0.99, 0.0, 0.0]),
                    doc("build", "Run the test suite with pytest.", vec![0.05, 0.0, 0.99, 0.0]),
                ],
            )
            .unwrap(),
        );
        Router::new(registry, EngineConfig::default())
    }

    #[test]
    fn test_general_query_performs_no_retrieval() {
        let routed = router()
            .route(&Query::new("hello there, who are you?", "unknown-project"), &query_vectors())
            .unwrap();
        assert_eq!(routed.intent.intent, Intent::General);
        assert_eq!(routed.outcome, RouteOutcome::NoRetrieval);
        assert_eq!(routed.trace.mode, CacheMode::Bypass);
    }

    #[test]
    fn test_recently_updated_scenario() {
        let routed = router()
            .route_with(
                &Query::new("What are the three most recently updated issues and their states?", "keras-io"),
                &query_vectors(),
                RouteOptions {
                    limit: Some(3),
                    ..RouteOptions::default()
                },
            )
            .unwrap();
        assert_eq!(routed.intent.intent, Intent::Issues);
        match routed.outcome {
            RouteOutcome::Tabular(answer) => {
                assert_eq!(answer.rule, "updated");
                let numbers: Vec<i64> = answer.rows.iter().map(|r| r["number"].as_i64().unwrap()).collect();
                assert_eq!(numbers, vec![3, 2, 4]);
            }
            other => panic!("expected tabular answer, got {other:?}"),
        }
    }

    #[test]
    fn test_state_counts_scenario() {
        let routed = router()
            .route(
                &Query::new("How many open issues versus closed issues?", "keras-io"),
                &query_vectors(),
            )
            .unwrap();
        match routed.outcome {
            RouteOutcome::Tabular(answer) => {
                assert_eq!(answer.rule, "stats");
                assert_eq!(answer.rows[0]["open"], 3);
                assert_eq!(answer.rows[0]["closed"], 1);
                assert_eq!(answer.rows[0]["total"], 4);
            }
            other => panic!("expected tabular answer, got {other:?}"),
        }
    }

    #[test]
    fn test_commit_query_reaches_commit_dataset() {
        let routed = router()
            .route(&Query::new("Who are the top contributors?", "keras-io"), &query_vectors())
            .unwrap();
        assert_eq!(routed.intent.intent, Intent::Commits);
        match routed.outcome {
            RouteOutcome::Tabular(answer) => {
                assert_eq!(answer.rule, "top_contributors");
                assert_eq!(answer.rows[0]["identity"], "ada");
                assert_eq!(answer.rows[0]["commits"], 2);
            }
            other => panic!("expected tabular answer, got {other:?}"),
        }
    }

    #[test]
    fn test_no_matching_rule_is_insufficient_data() {
        let routed = router()
            .route(&Query::new("Any bug reports about the tokenizer?", "keras-io"), &query_vectors())
            .unwrap();
        assert_eq!(routed.intent.intent, Intent::Issues);
        assert_eq!(
            routed.outcome,
            RouteOutcome::InsufficientData {
                data_source: DataSource::IssuesDataset,
                reason: InsufficientReason::NoMatchingQueryType,
            }
        );
    }

    #[test]
    fn test_voting_scenario_returns_low_scoring_real_evidence() {
        let routed = router()
            .route(
                &Query::new("What are the voting rules for technical decisions?", "keras-io"),
                &query_vectors(),
            )
            .unwrap();
        assert_eq!(routed.intent.intent, Intent::Governance);
        match routed.outcome {
            RouteOutcome::Evidence { items } => {
                assert!(!items.is_empty());
                for item in &items {
                    assert!(item.adjusted_score < 0.3);
                    assert!(
                        item.text == "Licensed under the Apache License 2.0."
                            || item.text == "Run the test suite with pytest."
                    );
                }
            }
            other => panic!("expected evidence, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_project_and_missing_dataset() {
        let r = router();
        let err = r
            .route(&Query::new("Who maintains the project?", "absent"), &query_vectors())
            .unwrap_err();
        assert!(matches!(
            err,
            OsspreyError::MissingDataset {
                data_source: DataSource::DocumentCorpus,
                ..
            }
        ));

        r.registry().replace_issues("issues-only", IssueDataset::new(vec![issue(1, "open", 1)]));
        let err = r
            .route(&Query::new("Show the latest commits", "issues-only"), &query_vectors())
            .unwrap_err();
        match err {
            OsspreyError::MissingDataset {
                project_id,
                data_source,
            } => {
                assert_eq!(project_id, "issues-only");
                assert_eq!(data_source, DataSource::CommitsDataset);
            }
            other => panic!("expected MissingDataset, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_corpus_skips_embedding() {
        let r = router();
        r.registry().replace_corpus(Corpus::new("empty", Vec::new()).unwrap());
        let routed = r
            .route(&Query::new("Who maintains the project?", "empty"), &FailingEmbedder)
            .unwrap();
        assert_eq!(
            routed.outcome,
            RouteOutcome::InsufficientData {
                data_source: DataSource::DocumentCorpus,
                reason: InsufficientReason::EmptyCorpus,
            }
        );
    }

    #[test]
    fn test_embedding_failure_propagates() {
        let err = router()
            .route(&Query::new("Who maintains the project?", "keras-io"), &FailingEmbedder)
            .unwrap_err();
        assert!(matches!(err, OsspreyError::Embedding(_)));
    }

    #[test]
    fn test_embedding_shape_must_match_corpus() {
        let r = router();
        let governance = Query::new("Who maintains the project?", "keras-io");

        let wrong_dims = QueryVectors::new(vec![1.0, 0.0, 0.0], vec![1.0; 8]);
        let err = r.route(&governance, &wrong_dims).unwrap_err();
        match err {
            OsspreyError::Embedding(message) => assert!(message.contains("3/8")),
            other => panic!("expected Embedding error, got {other:?}"),
        }

        let nan = QueryVectors::new(vec![1.0, f32::NAN], vec![1.0, 0.0, 0.0, 0.0]);
        assert!(matches!(r.route(&governance, &nan), Err(OsspreyError::Embedding(_))));
    }

    #[test]
    fn test_cache_hits_until_snapshot_changes() {
        let r = router();
        let query = Query::new("How many open issues versus closed issues?", "keras-io");
        let first = r.route(&query, &query_vectors()).unwrap();
        let second = r.route(&query, &query_vectors()).unwrap();
        assert_eq!(first.trace.mode, CacheMode::CacheMiss);
        assert_eq!(second.trace.mode, CacheMode::CacheHit);
        assert_eq!(first.outcome, second.outcome);

        r.registry().replace_issues("keras-io", IssueDataset::new(vec![issue(9, "closed", 1)]));
        let third = r.route(&query, &query_vectors()).unwrap();
        assert_eq!(third.trace.mode, CacheMode::CacheMiss);
        assert!(third.snapshot_version > first.snapshot_version);
        match third.outcome {
            RouteOutcome::Tabular(answer) => assert_eq!(answer.rows[0]["total"], 1),
            other => panic!("expected tabular answer, got {other:?}"),
        }
    }

    #[test]
    fn test_cache_disabled_bypasses_planner() {
        let registry = router().registry().clone();
        let config = EngineConfig {
            query_cache: false,
            ..EngineConfig::default()
        };
        let r = Router::new(registry, config);
        let query = Query::new("list the open issues", "keras-io");
        for _ in 0..2 {
            let routed = r.route(&query, &query_vectors()).unwrap();
            assert_eq!(routed.trace.mode, CacheMode::Bypass);
        }
        assert_eq!(r.planner_stats().entries, 0);
    }

    #[test]
    fn test_direct_retrieve_and_dispatch() {
        let r = router();
        let evidence = r
            .retrieve("keras-io", &query_vectors(), "license terms", Some(1))
            .unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].document_id, "license");

        let outcome = r
            .dispatch_tabular("keras-io", DatasetKind::Commits, "latest commits", Some(1))
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Resolved(_)));
    }
}
