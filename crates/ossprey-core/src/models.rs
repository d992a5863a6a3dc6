//! Shared typed models used across the classification, retrieval, and tabular
//! layers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::vectors::slice_and_normalize;

// ---------------------------------------------------------------------------
// Intents and data sources
// ---------------------------------------------------------------------------

/// The backend family a query is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Governance,
    Commits,
    Issues,
    General,
}

impl Intent {
    /// Tie-break order, highest priority first.
    pub const PRIORITY_ORDER: [Intent; 4] = [
        Intent::Governance,
        Intent::Issues,
        Intent::Commits,
        Intent::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Governance => "GOVERNANCE",
            Intent::Commits => "COMMITS",
            Intent::Issues => "ISSUES",
            Intent::General => "GENERAL",
        }
    }

    /// Position in [`Intent::PRIORITY_ORDER`]; lower wins ties.
    pub fn priority_rank(&self) -> usize {
        match self {
            Intent::Governance => 0,
            Intent::Issues => 1,
            Intent::Commits => 2,
            Intent::General => 3,
        }
    }

    pub fn data_source(&self) -> DataSource {
        match self {
            Intent::Governance => DataSource::DocumentCorpus,
            Intent::Commits => DataSource::CommitsDataset,
            Intent::Issues => DataSource::IssuesDataset,
            Intent::General => DataSource::None,
        }
    }

    pub fn parse(value: &str) -> Option<Intent> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GOVERNANCE" => Some(Intent::Governance),
            "COMMITS" => Some(Intent::Commits),
            "ISSUES" => Some(Intent::Issues),
            "GENERAL" => Some(Intent::General),
            _ => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the evidence for an intent comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    DocumentCorpus,
    CommitsDataset,
    IssuesDataset,
    None,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataSource::DocumentCorpus => "document corpus",
            DataSource::CommitsDataset => "commits dataset",
            DataSource::IssuesDataset => "issues dataset",
            DataSource::None => "no data source",
        };
        f.write_str(label)
    }
}

/// The two tabular datasets a project can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Commits,
    Issues,
}

impl DatasetKind {
    pub fn data_source(&self) -> DataSource {
        match self {
            DatasetKind::Commits => DataSource::CommitsDataset,
            DatasetKind::Issues => DataSource::IssuesDataset,
        }
    }
}

// ---------------------------------------------------------------------------
// Query and classification result
// ---------------------------------------------------------------------------

/// A single user question scoped to one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub project_id: String,
}

impl Query {
    pub fn new(text: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            project_id: project_id.into(),
        }
    }
}

/// Which classifier stage produced an [`IntentResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    PriorityPhrase,
    KeywordScore,
    Conversational,
    Degenerate,
    NoMatch,
}

/// Outcome of intent classification.
///
/// `confidence` is a heuristic ranking signal kept for diagnostics; it is not
/// a calibrated probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub method: ClassificationMethod,
}

impl IntentResult {
    pub fn new(
        intent: Intent,
        confidence: f64,
        evidence: Vec<String>,
        method: ClassificationMethod,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            intent,
            confidence,
            evidence,
            method,
        }
    }

    /// GENERAL with zero confidence and no evidence.
    pub fn unmatched(method: ClassificationMethod) -> Self {
        Self::new(Intent::General, 0.0, Vec::new(), method)
    }
}

// ---------------------------------------------------------------------------
// Document corpus records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_path: String,
    pub project_id: String,
}

/// One indexed text chunk with its two embedding precisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub text: String,
    /// Low-dimensional vector used by the shortlist stage.
    pub shortlist_embedding: Vec<f32>,
    /// Full-precision vector used by the rerank stage.
    pub rerank_embedding: Vec<f32>,
    pub metadata: DocumentMetadata,
}

impl DocumentRecord {
    /// Build a record whose shortlist vector is the normalized
    /// `shortlist_dims`-prefix of the full embedding.
    pub fn from_full_embedding(
        id: impl Into<String>,
        text: impl Into<String>,
        full_embedding: Vec<f32>,
        shortlist_dims: usize,
        metadata: DocumentMetadata,
    ) -> Self {
        let shortlist_embedding = slice_and_normalize(&full_embedding, shortlist_dims);
        Self {
            id: id.into(),
            text: text.into(),
            shortlist_embedding,
            rerank_embedding: full_embedding,
            metadata,
        }
    }
}

// ---------------------------------------------------------------------------
// Tabular rows
// ---------------------------------------------------------------------------

/// One commit-file row: a commit touching a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRow {
    #[serde(default)]
    pub commit_sha: Option<String>,
    #[serde(alias = "name", alias = "author_name")]
    pub author: String,
    #[serde(default, alias = "email")]
    pub author_email: Option<String>,
    #[serde(alias = "date", alias = "date_time")]
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "filename")]
    pub file_path: String,
    pub lines_added: i64,
    pub lines_deleted: i64,
    #[serde(default)]
    pub message: Option<String>,
}

impl CommitRow {
    /// Author identity used for grouping: lowercased email when present,
    /// otherwise the trimmed author name.
    pub fn identity(&self) -> String {
        match self.author_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_lowercase(),
            _ => self.author.trim().to_string(),
        }
    }

    pub fn change_magnitude(&self) -> i64 {
        self.lines_added.max(0) + self.lines_deleted.max(0)
    }
}

/// One issue with its tracker state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRow {
    #[serde(alias = "issue_num")]
    pub number: i64,
    pub title: String,
    #[serde(alias = "user_login", alias = "author")]
    pub reporter: String,
    #[serde(alias = "issue_state")]
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comment_count: u64,
}

/// Canonical tracker states; anything else is counted as "other".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
    Other,
}

impl IssueState {
    pub fn classify(raw: &str) -> IssueState {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("open") {
            IssueState::Open
        } else if value.eq_ignore_ascii_case("closed") {
            IssueState::Closed
        } else {
            IssueState::Other
        }
    }
}

impl IssueRow {
    pub fn issue_state(&self) -> IssueState {
        IssueState::classify(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_round_trips_through_parse() {
        for intent in Intent::PRIORITY_ORDER {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::parse(" issues "), Some(Intent::Issues));
        assert_eq!(Intent::parse("sustainability"), None);
    }

    #[test]
    fn test_intent_result_clamps_confidence() {
        let high = IntentResult::new(Intent::Commits, 4.0, vec![], ClassificationMethod::KeywordScore);
        assert_eq!(high.confidence, 1.0);
        let low = IntentResult::new(Intent::Commits, -1.0, vec![], ClassificationMethod::KeywordScore);
        assert_eq!(low.confidence, 0.0);
        let nan = IntentResult::new(Intent::Commits, f64::NAN, vec![], ClassificationMethod::KeywordScore);
        assert_eq!(nan.confidence, 0.0);
    }

    #[test]
    fn test_issue_state_is_case_insensitive() {
        assert_eq!(IssueState::classify("open"), IssueState::Open);
        assert_eq!(IssueState::classify("OPEN"), IssueState::Open);
        assert_eq!(IssueState::classify(" Closed "), IssueState::Closed);
        assert_eq!(IssueState::classify("merged"), IssueState::Other);
        assert_eq!(IssueState::classify(""), IssueState::Other);
    }

    #[test]
    fn test_commit_identity_prefers_email() {
        let row: CommitRow = serde_json::from_value(serde_json::json!({
            "name": "Ada",
            "email": "Ada@Example.org",
            "date": "2024-03-01T10:00:00Z",
            "filename": "src/lib.rs",
            "lines_added": 3,
            "lines_deleted": 1,
        }))
        .unwrap();
        assert_eq!(row.identity(), "ada@example.org");
        assert_eq!(row.change_magnitude(), 4);

        let anonymous = CommitRow {
            author_email: None,
            ..row
        };
        assert_eq!(anonymous.identity(), "Ada");
    }

    #[test]
    fn test_issue_row_accepts_legacy_column_names() {
        let row: IssueRow = serde_json::from_value(serde_json::json!({
            "issue_num": 12,
            "title": "Crash on start",
            "user_login": "octocat",
            "issue_state": "OPEN",
            "created_at": "2024-01-02T03:04:05Z",
            "updated_at": "2024-01-05T03:04:05Z",
            "comment_count": 7,
        }))
        .unwrap();
        assert_eq!(row.number, 12);
        assert_eq!(row.reporter, "octocat");
        assert_eq!(row.issue_state(), IssueState::Open);
    }

    #[test]
    fn test_document_from_full_embedding_slices_prefix() {
        let doc = DocumentRecord::from_full_embedding(
            "d1",
            "text",
            vec![3.0, 4.0, 12.0],
            2,
            DocumentMetadata {
                source_path: "GOVERNANCE.md".into(),
                project_id: "p".into(),
            },
        );
        assert_eq!(doc.rerank_embedding, vec![3.0, 4.0, 12.0]);
        assert!((doc.shortlist_embedding[0] - 0.6).abs() < 1e-6);
        assert!((doc.shortlist_embedding[1] - 0.8).abs() < 1e-6);
    }
}
