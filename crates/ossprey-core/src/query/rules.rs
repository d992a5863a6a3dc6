//! Ordered keyword rule tables mapping a tabular query to a canonical
//! aggregation.
//!
//! Tables are evaluated top to bottom and the first rule with a keyword that
//! occurs in the normalized query wins. A rule whose keyword is a substring of
//! another rule's keyword must come after it: the issues table lists
//! `updated` before `stats` so "states" in "recently updated issues and their
//! states" cannot trigger the `stat` fragment.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::DatasetKind;

/// Timestamp column a `latest` query orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeField {
    Committed,
    Created,
    Updated,
}

impl TimeField {
    pub fn column(&self) -> &'static str {
        match self {
            TimeField::Committed => "timestamp",
            TimeField::Created => "created_at",
            TimeField::Updated => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanonicalQueryType {
    Latest { limit: usize, by: TimeField },
    TopContributors { limit: usize },
    ByFile { limit: usize },
    Stats,
    Open { limit: usize },
    Closed { limit: usize },
    ByUser { limit: usize },
    MostCommented { limit: usize },
}

impl CanonicalQueryType {
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalQueryType::Latest { .. } => "latest",
            CanonicalQueryType::TopContributors { .. } => "top_contributors",
            CanonicalQueryType::ByFile { .. } => "by_file",
            CanonicalQueryType::Stats => "stats",
            CanonicalQueryType::Open { .. } => "open",
            CanonicalQueryType::Closed { .. } => "closed",
            CanonicalQueryType::ByUser { .. } => "by_user",
            CanonicalQueryType::MostCommented { .. } => "most_commented",
        }
    }

    /// Row limit `N`, or `None` for aggregate-only types.
    pub fn limit(&self) -> Option<usize> {
        match *self {
            CanonicalQueryType::Latest { limit, .. }
            | CanonicalQueryType::TopContributors { limit }
            | CanonicalQueryType::ByFile { limit }
            | CanonicalQueryType::Open { limit }
            | CanonicalQueryType::Closed { limit }
            | CanonicalQueryType::ByUser { limit }
            | CanonicalQueryType::MostCommented { limit } => Some(limit),
            CanonicalQueryType::Stats => None,
        }
    }

    /// Same type with `N` replaced. No-op for `Stats`.
    pub fn with_limit(self, limit: usize) -> Self {
        match self {
            CanonicalQueryType::Latest { by, .. } => CanonicalQueryType::Latest { limit, by },
            CanonicalQueryType::TopContributors { .. } => {
                CanonicalQueryType::TopContributors { limit }
            }
            CanonicalQueryType::ByFile { .. } => CanonicalQueryType::ByFile { limit },
            CanonicalQueryType::Stats => CanonicalQueryType::Stats,
            CanonicalQueryType::Open { .. } => CanonicalQueryType::Open { limit },
            CanonicalQueryType::Closed { .. } => CanonicalQueryType::Closed { limit },
            CanonicalQueryType::ByUser { .. } => CanonicalQueryType::ByUser { limit },
            CanonicalQueryType::MostCommented { .. } => {
                CanonicalQueryType::MostCommented { limit }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTypeRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    /// Substrings that veto the rule even when a keyword occurs.
    pub excludes: &'static [&'static str],
    pub query_type: CanonicalQueryType,
}

impl QueryTypeRule {
    /// First keyword of this rule occurring in `normalized_query`, unless an
    /// exclusion also occurs.
    pub fn matched_keyword(&self, normalized_query: &str) -> Option<&'static str> {
        if self.excludes.iter().any(|ex| normalized_query.contains(ex)) {
            return None;
        }
        self.keywords
            .iter()
            .copied()
            .find(|kw| normalized_query.contains(kw))
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

pub const COMMIT_RULES: &[QueryTypeRule] = &[
    QueryTypeRule {
        name: "top_contributors",
        keywords: &[
            "top contributor",
            "most active",
            "most commits",
            "who contributes",
            "contributors",
        ],
        excludes: &[],
        query_type: CanonicalQueryType::TopContributors { limit: 10 },
    },
    QueryTypeRule {
        name: "by_file",
        keywords: &["file", "modified", "changed the most"],
        excludes: &[],
        query_type: CanonicalQueryType::ByFile { limit: 10 },
    },
    QueryTypeRule {
        name: "latest",
        keywords: &["latest", "recent", "newest", "last"],
        excludes: &[],
        query_type: CanonicalQueryType::Latest {
            limit: 10,
            by: TimeField::Committed,
        },
    },
    QueryTypeRule {
        name: "stats",
        keywords: &["stat", "summary", "how many", "total"],
        excludes: &[],
        query_type: CanonicalQueryType::Stats,
    },
];

pub const ISSUE_RULES: &[QueryTypeRule] = &[
    QueryTypeRule {
        name: "most_commented",
        keywords: &[
            "comment count",
            "most comment",
            "highest comment",
            "most discussed",
            "discussion",
        ],
        excludes: &[],
        query_type: CanonicalQueryType::MostCommented { limit: 5 },
    },
    QueryTypeRule {
        name: "updated",
        keywords: &["updated", "most recent activity"],
        excludes: &[],
        query_type: CanonicalQueryType::Latest {
            limit: 5,
            by: TimeField::Updated,
        },
    },
    QueryTypeRule {
        name: "by_user",
        keywords: &["who opened", "who reported", "reported by", "opened by", "top reporters"],
        excludes: &[],
        query_type: CanonicalQueryType::ByUser { limit: 10 },
    },
    QueryTypeRule {
        name: "stats",
        keywords: &["stat", "how many", "total", "versus", " vs", "breakdown"],
        excludes: &[],
        query_type: CanonicalQueryType::Stats,
    },
    QueryTypeRule {
        name: "open",
        keywords: &["open"],
        excludes: &["closed", "opened"],
        query_type: CanonicalQueryType::Open { limit: 5 },
    },
    QueryTypeRule {
        name: "closed",
        keywords: &["closed", "resolved"],
        excludes: &["open"],
        query_type: CanonicalQueryType::Closed { limit: 5 },
    },
    QueryTypeRule {
        name: "latest",
        keywords: &["latest", "recent", "newest", "last"],
        excludes: &[],
        query_type: CanonicalQueryType::Latest {
            limit: 5,
            by: TimeField::Created,
        },
    },
];

pub fn rules_for(kind: DatasetKind) -> &'static [QueryTypeRule] {
    match kind {
        DatasetKind::Commits => COMMIT_RULES,
        DatasetKind::Issues => ISSUE_RULES,
    }
}

/// First rule in `table` firing on `normalized_query`.
pub fn resolve<'t>(table: &'t [QueryTypeRule], normalized_query: &str) -> Option<&'t QueryTypeRule> {
    for rule in table {
        if let Some(keyword) = rule.matched_keyword(normalized_query) {
            debug!("Rule {} fired on keyword {:?}", rule.name, keyword);
            return Some(rule);
        }
    }
    None
}
