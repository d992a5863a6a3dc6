//! Canonical aggregations over commit and issue tables.
//!
//! [`dispatch`] resolves the query against the dataset's rule table and runs
//! the fired rule's aggregation. Grouping keeps first-seen order and every
//! sort is stable, so ties resolve by original row order.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::{CommitRow, DatasetKind, IssueRow, IssueState};
use crate::query::guards::{clamp_limit, MAX_RESULT_LIMIT};
use crate::query::rules::{resolve, rules_for, CanonicalQueryType, TimeField};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularAnswer {
    pub rule: &'static str,
    pub query_type: CanonicalQueryType,
    pub rows: Vec<Value>,
    pub summary: String,
    /// Rows matching before the limit was applied.
    pub total_matched: usize,
}

/// The three distinguishable dispatcher results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Resolved(TabularAnswer),
    /// No rule fired.
    NoMatchingQueryType,
    /// A rule fired but produced zero rows.
    EmptyResult {
        rule: &'static str,
        query_type: CanonicalQueryType,
    },
}

/// Rows, match count and summary produced by one aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub rows: Vec<Value>,
    pub total_matched: usize,
    pub summary: String,
}

/// A row type the dispatcher can aggregate.
pub trait TabularRecord: DeserializeOwned + Send + Sync + 'static {
    const KIND: DatasetKind;

    /// Run `query_type` over `rows`; `None` when the type does not apply to
    /// this dataset.
    fn aggregate(rows: &[Self], query_type: CanonicalQueryType) -> Option<Aggregation>;
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Resolve `normalized_query` against the rule table for `R` and aggregate.
///
/// `limit_override` replaces the rule's default `N` (clamped to
/// [`MAX_RESULT_LIMIT`]).
pub fn dispatch<R: TabularRecord>(
    normalized_query: &str,
    rows: &[R],
    limit_override: Option<usize>,
) -> DispatchOutcome {
    let Some(rule) = resolve(rules_for(R::KIND), normalized_query) else {
        debug!("No {:?} rule matched query", R::KIND);
        return DispatchOutcome::NoMatchingQueryType;
    };

    let query_type = match limit_override {
        Some(limit) => rule.query_type.with_limit(clamp_limit(limit, MAX_RESULT_LIMIT)),
        None => rule.query_type,
    };

    let Some(aggregation) = R::aggregate(rows, query_type) else {
        warn!("Rule {} is not applicable to {:?} rows", rule.name, R::KIND);
        return DispatchOutcome::NoMatchingQueryType;
    };

    if aggregation.rows.is_empty() {
        return DispatchOutcome::EmptyResult {
            rule: rule.name,
            query_type,
        };
    }

    DispatchOutcome::Resolved(TabularAnswer {
        rule: rule.name,
        query_type,
        rows: aggregation.rows,
        summary: aggregation.summary,
        total_matched: aggregation.total_matched,
    })
}

/// Indices of `rows` ordered by `key` descending; ties keep row order.
fn ranked_indices<T, K: Ord>(rows: &[T], key: impl Fn(&T) -> K) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| key(&rows[b]).cmp(&key(&rows[a])));
    order
}

// ---------------------------------------------------------------------------
// Commits
// ---------------------------------------------------------------------------

fn commit_json(row: &CommitRow) -> Value {
    json!({
        "commit_sha": row.commit_sha,
        "author": row.author,
        "author_email": row.author_email,
        "timestamp": row.timestamp.to_rfc3339(),
        "file_path": row.file_path,
        "lines_added": row.lines_added,
        "lines_deleted": row.lines_deleted,
        "message": row.message,
    })
}

/// Keeps the first row per `commit_sha` in `order`. Rows without a sha are
/// each their own commit.
fn distinct_commit_indices(rows: &[CommitRow], order: Vec<usize>) -> Vec<usize> {
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    order
        .into_iter()
        .filter(|&idx| match rows[idx].commit_sha.as_deref() {
            Some(sha) if !sha.is_empty() => seen.insert(sha, ()).is_none(),
            _ => true,
        })
        .collect()
}

#[derive(Default)]
struct ContributorTotals {
    author: String,
    rows: usize,
    lines_added: i64,
    lines_deleted: i64,
}

#[derive(Default)]
struct FileTotals {
    rows: usize,
    lines_added: i64,
    lines_deleted: i64,
}

impl FileTotals {
    fn total(&self) -> i64 {
        self.lines_added.max(0) + self.lines_deleted.max(0)
    }
}

impl TabularRecord for CommitRow {
    const KIND: DatasetKind = DatasetKind::Commits;

    fn aggregate(rows: &[Self], query_type: CanonicalQueryType) -> Option<Aggregation> {
        let aggregation = match query_type {
            CanonicalQueryType::Latest { limit, .. } => {
                let distinct = distinct_commit_indices(rows, ranked_indices(rows, |r| r.timestamp));
                let total_matched = distinct.len();
                let selected: Vec<Value> = distinct
                    .into_iter()
                    .take(limit)
                    .map(|idx| commit_json(&rows[idx]))
                    .collect();
                Aggregation {
                    summary: format!("Latest {} distinct commits", selected.len()),
                    total_matched,
                    rows: selected,
                }
            }
            CanonicalQueryType::TopContributors { limit } => top_contributors(rows, limit),
            CanonicalQueryType::ByFile { limit } => by_file(rows, limit),
            CanonicalQueryType::Stats => commit_stats(rows),
            _ => return None,
        };
        Some(aggregation)
    }
}

fn top_contributors(rows: &[CommitRow], limit: usize) -> Aggregation {
    let mut groups: IndexMap<String, ContributorTotals> = IndexMap::new();
    for row in rows {
        let entry = groups.entry(row.identity()).or_insert_with(|| ContributorTotals {
            author: row.author.trim().to_string(),
            ..ContributorTotals::default()
        });
        entry.rows += 1;
        entry.lines_added += row.lines_added;
        entry.lines_deleted += row.lines_deleted;
    }

    let mut ranked: Vec<(String, ContributorTotals)> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1.rows.cmp(&a.1.rows));
    let total_matched = ranked.len();

    let selected: Vec<Value> = ranked
        .into_iter()
        .take(limit)
        .map(|(identity, totals)| {
            json!({
                "author": totals.author,
                "identity": identity,
                "commits": totals.rows,
                "lines_added": totals.lines_added,
                "lines_deleted": totals.lines_deleted,
            })
        })
        .collect();

    Aggregation {
        summary: format!("Top {} contributors by commit count", selected.len()),
        total_matched,
        rows: selected,
    }
}

fn by_file(rows: &[CommitRow], limit: usize) -> Aggregation {
    let mut groups: IndexMap<&str, FileTotals> = IndexMap::new();
    for row in rows {
        let entry = groups.entry(row.file_path.as_str()).or_default();
        entry.rows += 1;
        entry.lines_added += row.lines_added;
        entry.lines_deleted += row.lines_deleted;
    }

    let mut ranked: Vec<(&str, FileTotals)> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total().cmp(&a.1.total()));
    let total_matched = ranked.len();

    let selected: Vec<Value> = ranked
        .into_iter()
        .take(limit)
        .map(|(path, totals)| {
            json!({
                "file_path": path,
                "commits": totals.rows,
                "lines_added": totals.lines_added,
                "lines_deleted": totals.lines_deleted,
                "total_changes": totals.total(),
            })
        })
        .collect();

    Aggregation {
        summary: format!("Top {} files by lines changed", selected.len()),
        total_matched,
        rows: selected,
    }
}

fn commit_stats(rows: &[CommitRow]) -> Aggregation {
    if rows.is_empty() {
        return Aggregation {
            rows: Vec::new(),
            total_matched: 0,
            summary: "No commits recorded".to_string(),
        };
    }

    let mut commits: IndexMap<&str, ()> = IndexMap::new();
    let mut authors: IndexMap<String, ()> = IndexMap::new();
    let mut files: IndexMap<&str, ()> = IndexMap::new();
    let mut unkeyed_commits = 0usize;
    let (mut lines_added, mut lines_deleted) = (0i64, 0i64);

    for row in rows {
        match row.commit_sha.as_deref() {
            Some(sha) if !sha.is_empty() => {
                commits.insert(sha, ());
            }
            _ => unkeyed_commits += 1,
        }
        authors.insert(row.identity(), ());
        files.insert(row.file_path.as_str(), ());
        lines_added += row.lines_added;
        lines_deleted += row.lines_deleted;
    }

    let total_commits = commits.len() + unkeyed_commits;
    let first = rows.iter().map(|r| r.timestamp).min();
    let last = rows.iter().map(|r| r.timestamp).max();

    Aggregation {
        summary: format!(
            "Project statistics: {} commits by {} authors",
            total_commits,
            authors.len()
        ),
        total_matched: rows.len(),
        rows: vec![json!({
            "total_commits": total_commits,
            "total_rows": rows.len(),
            "distinct_authors": authors.len(),
            "distinct_files": files.len(),
            "lines_added": lines_added,
            "lines_deleted": lines_deleted,
            "first_commit": first.map(|t| t.to_rfc3339()),
            "last_commit": last.map(|t| t.to_rfc3339()),
        })],
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

fn issue_json(row: &IssueRow) -> Value {
    json!({
        "number": row.number,
        "title": row.title,
        "reporter": row.reporter,
        "state": row.state,
        "created_at": row.created_at.to_rfc3339(),
        "updated_at": row.updated_at.to_rfc3339(),
        "comment_count": row.comment_count,
    })
}

#[derive(Default)]
struct StateCounts {
    open: usize,
    closed: usize,
    other: usize,
}

impl StateCounts {
    fn record(&mut self, state: IssueState) {
        match state {
            IssueState::Open => self.open += 1,
            IssueState::Closed => self.closed += 1,
            IssueState::Other => self.other += 1,
        }
    }
}

impl TabularRecord for IssueRow {
    const KIND: DatasetKind = DatasetKind::Issues;

    fn aggregate(rows: &[Self], query_type: CanonicalQueryType) -> Option<Aggregation> {
        let aggregation = match query_type {
            CanonicalQueryType::Latest { limit, by } => {
                let order = match by {
                    TimeField::Updated => ranked_indices(rows, |r| r.updated_at),
                    TimeField::Created | TimeField::Committed => {
                        ranked_indices(rows, |r| r.created_at)
                    }
                };
                let selected: Vec<Value> = order
                    .into_iter()
                    .take(limit)
                    .map(|idx| issue_json(&rows[idx]))
                    .collect();
                let summary = match by {
                    TimeField::Updated => {
                        format!("Most recently updated {} issues", selected.len())
                    }
                    _ => format!("Latest {} issues", selected.len()),
                };
                Aggregation {
                    summary,
                    total_matched: rows.len(),
                    rows: selected,
                }
            }
            CanonicalQueryType::Open { limit } => {
                issues_in_state(rows, IssueState::Open, limit, |r| r.created_at)
            }
            CanonicalQueryType::Closed { limit } => {
                issues_in_state(rows, IssueState::Closed, limit, |r| r.updated_at)
            }
            CanonicalQueryType::ByUser { limit } => by_reporter(rows, limit),
            CanonicalQueryType::MostCommented { limit } => {
                let selected: Vec<Value> = ranked_indices(rows, |r| r.comment_count)
                    .into_iter()
                    .take(limit)
                    .map(|idx| issue_json(&rows[idx]))
                    .collect();
                Aggregation {
                    summary: format!("Most commented issues: {} shown", selected.len()),
                    total_matched: rows.len(),
                    rows: selected,
                }
            }
            CanonicalQueryType::Stats => issue_stats(rows),
            _ => return None,
        };
        Some(aggregation)
    }
}

fn issues_in_state<K: Ord>(
    rows: &[IssueRow],
    state: IssueState,
    limit: usize,
    key: impl Fn(&IssueRow) -> K,
) -> Aggregation {
    let matching: Vec<&IssueRow> = rows.iter().filter(|r| r.issue_state() == state).collect();
    let total_matched = matching.len();
    let selected: Vec<Value> = ranked_indices(&matching, |r| key(*r))
        .into_iter()
        .take(limit)
        .map(|idx| issue_json(matching[idx]))
        .collect();
    let label = match state {
        IssueState::Open => "Open",
        IssueState::Closed => "Closed",
        IssueState::Other => "Other",
    };
    Aggregation {
        summary: format!(
            "{} issues: {} shown (total: {})",
            label,
            selected.len(),
            total_matched
        ),
        total_matched,
        rows: selected,
    }
}

fn by_reporter(rows: &[IssueRow], limit: usize) -> Aggregation {
    let mut groups: IndexMap<&str, (usize, StateCounts)> = IndexMap::new();
    for row in rows {
        let entry = groups.entry(row.reporter.trim()).or_default();
        entry.0 += 1;
        entry.1.record(row.issue_state());
    }

    let mut ranked: Vec<(&str, (usize, StateCounts))> = groups.into_iter().collect();
    ranked.sort_by(|a, b| (b.1).0.cmp(&(a.1).0));
    let total_matched = ranked.len();

    let selected: Vec<Value> = ranked
        .into_iter()
        .take(limit)
        .map(|(reporter, (count, states))| {
            json!({
                "reporter": reporter,
                "issues": count,
                "open": states.open,
                "closed": states.closed,
                "other": states.other,
            })
        })
        .collect();

    Aggregation {
        summary: format!("Top {} issue reporters", selected.len()),
        total_matched,
        rows: selected,
    }
}

fn issue_stats(rows: &[IssueRow]) -> Aggregation {
    if rows.is_empty() {
        return Aggregation {
            rows: Vec::new(),
            total_matched: 0,
            summary: "No issues recorded".to_string(),
        };
    }

    let mut states = StateCounts::default();
    let mut reporters: IndexMap<&str, ()> = IndexMap::new();
    let mut comments = 0u64;
    for row in rows {
        states.record(row.issue_state());
        reporters.insert(row.reporter.trim(), ());
        comments += row.comment_count;
    }

    Aggregation {
        summary: format!(
            "Issue statistics: {} total ({} open, {} closed, {} other)",
            rows.len(),
            states.open,
            states.closed,
            states.other
        ),
        total_matched: rows.len(),
        rows: vec![json!({
            "total": rows.len(),
            "open": states.open,
            "closed": states.closed,
            "other": states.other,
            "distinct_reporters": reporters.len(),
            "total_comments": comments,
        })],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn commit(author: &str, email: Option<&str>, day: u32, file: &str, added: i64, deleted: i64) -> CommitRow {
        CommitRow {
            commit_sha: Some(format!("{author}-{day}")),
            author: author.to_string(),
            author_email: email.map(str::to_string),
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            file_path: file.to_string(),
            lines_added: added,
            lines_deleted: deleted,
            message: None,
        }
    }

    fn issue(number: i64, reporter: &str, state: &str, created: u32, updated: u32, comments: u64) -> IssueRow {
        IssueRow {
            number,
            title: format!("Issue {number}"),
            reporter: reporter.to_string(),
            state: state.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 2, created, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, updated, 0, 0, 0).unwrap(),
            comment_count: comments,
        }
    }

    fn resolved(outcome: DispatchOutcome) -> TabularAnswer {
        match outcome {
            DispatchOutcome::Resolved(answer) => answer,
            other => panic!("expected resolved answer, got {other:?}"),
        }
    }

    fn commits() -> Vec<CommitRow> {
        vec![
            commit("Ada", Some("ada@example.org"), 1, "src/lib.rs", 10, 2),
            commit("Grace", None, 3, "README.md", 1, 1),
            commit("ada", Some("ADA@example.org"), 2, "src/main.rs", 5, 0),
            commit("Grace", None, 3, "src/lib.rs", 20, 4),
        ]
    }

    #[test]
    fn test_issue_stats_state_counts() {
        let rows = vec![
            issue(1, "a", "open", 1, 1, 0),
            issue(2, "b", "open", 2, 2, 0),
            issue(3, "a", "closed", 3, 3, 0),
        ];
        let answer = resolved(dispatch("issue stats", &rows, None));
        assert_eq!(answer.rule, "stats");
        assert_eq!(answer.rows[0]["open"], 2);
        assert_eq!(answer.rows[0]["closed"], 1);
        assert_eq!(answer.rows[0]["total"], 3);
        assert_eq!(answer.rows[0]["other"], 0);
    }

    #[test]
    fn test_state_counts_ignore_casing() {
        let lower = vec![issue(1, "a", "open", 1, 1, 0), issue(2, "a", "closed", 1, 1, 0)];
        let mixed = vec![issue(1, "a", "OPEN", 1, 1, 0), issue(2, "a", "Closed", 1, 1, 0)];
        let a = resolved(dispatch("how many issues", &lower, None));
        let b = resolved(dispatch("how many issues", &mixed, None));
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn test_unknown_states_land_in_other_bucket() {
        let rows = vec![issue(1, "a", "merged", 1, 1, 0), issue(2, "a", "open", 1, 1, 0)];
        let answer = resolved(dispatch("issue stats", &rows, None));
        assert_eq!(answer.rows[0]["other"], 1);
        assert_eq!(answer.rows[0]["open"], 1);
    }

    #[test]
    fn test_recently_updated_orders_by_updated_at() {
        let rows = vec![
            issue(1, "a", "open", 9, 1, 0),
            issue(2, "b", "closed", 1, 9, 0),
            issue(3, "c", "open", 5, 5, 0),
            issue(4, "d", "open", 2, 2, 0),
        ];
        let answer = resolved(dispatch(
            "three most recently updated issues and their states",
            &rows,
            Some(3),
        ));
        assert_eq!(answer.rule, "updated");
        let numbers: Vec<i64> = answer.rows.iter().map(|r| r["number"].as_i64().unwrap()).collect();
        assert_eq!(numbers, vec![2, 3, 4]);
        assert_eq!(answer.rows[0]["state"], "closed");
    }

    #[test]
    fn test_open_issues_summary_reports_total() {
        let rows: Vec<IssueRow> = (1..=7).map(|n| issue(n, "a", "Open", n as u32, 1, 0)).collect();
        let answer = resolved(dispatch("list open issues", &rows, None));
        assert_eq!(answer.rows.len(), 5);
        assert_eq!(answer.total_matched, 7);
        assert_eq!(answer.summary, "Open issues: 5 shown (total: 7)");
        assert_eq!(answer.rows[0]["number"], 7);
    }

    #[test]
    fn test_closed_with_no_matches_is_empty_result() {
        let rows = vec![issue(1, "a", "open", 1, 1, 0)];
        match dispatch("recently closed issues", &rows, None) {
            DispatchOutcome::EmptyResult { rule, .. } => assert_eq!(rule, "closed"),
            other => panic!("expected empty result, got {other:?}"),
        }
    }

    #[test]
    fn test_no_rule_is_distinct_from_empty() {
        let rows = vec![issue(1, "a", "open", 1, 1, 0)];
        assert_eq!(
            dispatch("explain the governance model", &rows, None),
            DispatchOutcome::NoMatchingQueryType
        );
        let empty: Vec<IssueRow> = Vec::new();
        assert!(matches!(
            dispatch("issue stats", &empty, None),
            DispatchOutcome::EmptyResult { .. }
        ));
    }

    #[test]
    fn test_most_commented_ties_keep_row_order() {
        let rows = vec![
            issue(1, "a", "open", 1, 1, 4),
            issue(2, "b", "open", 1, 1, 9),
            issue(3, "c", "open", 1, 1, 4),
        ];
        let answer = resolved(dispatch("issues with the most comments", &rows, None));
        let numbers: Vec<i64> = answer.rows.iter().map(|r| r["number"].as_i64().unwrap()).collect();
        assert_eq!(numbers, vec![2, 1, 3]);
    }

    #[test]
    fn test_by_user_groups_reporters() {
        let rows = vec![
            issue(1, "octo", "open", 1, 1, 0),
            issue(2, "cat", "closed", 1, 1, 0),
            issue(3, "octo", "closed", 1, 1, 0),
        ];
        let answer = resolved(dispatch("who opened the most issues", &rows, None));
        assert_eq!(answer.rows[0]["reporter"], "octo");
        assert_eq!(answer.rows[0]["issues"], 2);
        assert_eq!(answer.rows[0]["open"], 1);
        assert_eq!(answer.rows[1]["reporter"], "cat");
    }

    #[test]
    fn test_top_contributors_group_by_identity() {
        let answer = resolved(dispatch("who are the top contributors", &commits(), None));
        assert_eq!(answer.rule, "top_contributors");
        // Ada's two rows share an email despite different name casing; Grace
        // has no email and groups by name. Tie resolves first-seen.
        assert_eq!(answer.rows[0]["identity"], "ada@example.org");
        assert_eq!(answer.rows[0]["commits"], 2);
        assert_eq!(answer.rows[0]["lines_added"], 15);
        assert_eq!(answer.rows[1]["identity"], "Grace");
        assert_eq!(answer.total_matched, 2);
    }

    #[test]
    fn test_by_file_sums_change_magnitude() {
        let answer = resolved(dispatch("which files changed the most", &commits(), None));
        assert_eq!(answer.rule, "by_file");
        assert_eq!(answer.rows[0]["file_path"], "src/lib.rs");
        assert_eq!(answer.rows[0]["total_changes"], 36);
        assert_eq!(answer.rows[0]["commits"], 2);
    }

    #[test]
    fn test_latest_commits_ties_keep_row_order() {
        let answer = resolved(dispatch("show the latest commits", &commits(), Some(3)));
        let files: Vec<&str> = answer.rows.iter().map(|r| r["file_path"].as_str().unwrap()).collect();
        // Grace-3 touched two files; only its first row survives.
        assert_eq!(files, vec!["README.md", "src/main.rs", "src/lib.rs"]);
        assert_eq!(answer.summary, "Latest 3 distinct commits");
        assert_eq!(answer.total_matched, 3);
    }

    #[test]
    fn test_latest_commits_are_distinct_by_sha() {
        let mut rows: Vec<CommitRow> = ["a.rs", "b.rs", "c.rs"]
            .into_iter()
            .map(|file| CommitRow {
                commit_sha: Some("abc".to_string()),
                ..commit("Ada", None, 5, file, 1, 0)
            })
            .collect();
        rows.push(CommitRow {
            commit_sha: Some("def".to_string()),
            ..commit("Grace", None, 2, "d.rs", 1, 0)
        });
        rows.push(CommitRow {
            commit_sha: None,
            ..commit("Linus", None, 1, "e.rs", 1, 0)
        });
        rows.push(CommitRow {
            commit_sha: None,
            ..commit("Linus", None, 1, "f.rs", 1, 0)
        });

        let answer = resolved(dispatch("show the latest commits", &rows, Some(2)));
        let shas: Vec<&str> = answer.rows.iter().map(|r| r["commit_sha"].as_str().unwrap()).collect();
        assert_eq!(shas, vec!["abc", "def"]);
        assert_eq!(answer.summary, "Latest 2 distinct commits");

        let all = resolved(dispatch("show the latest commits", &rows, Some(10)));
        let files: Vec<&str> = all.rows.iter().map(|r| r["file_path"].as_str().unwrap()).collect();
        assert_eq!(files, vec!["a.rs", "d.rs", "e.rs", "f.rs"]);
        assert_eq!(all.total_matched, 4);
    }

    #[test]
    fn test_commit_stats() {
        let answer = resolved(dispatch("how many commits are there", &commits(), None));
        let stats = &answer.rows[0];
        assert_eq!(stats["total_rows"], 4);
        assert_eq!(stats["total_commits"], 3);
        assert_eq!(stats["distinct_authors"], 2);
        assert_eq!(stats["distinct_files"], 3);
        assert_eq!(answer.summary, "Project statistics: 3 commits by 2 authors");
    }

    #[test]
    fn test_limit_override_is_clamped() {
        let answer = resolved(dispatch("show the latest commits", &commits(), Some(0)));
        assert_eq!(answer.rows.len(), 1);
        assert_eq!(answer.query_type.limit(), Some(1));
    }
}
