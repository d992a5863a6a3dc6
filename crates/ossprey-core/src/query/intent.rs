//! Intent classification with priority-phrase override.
//!
//! Stages, in order:
//!
//! 1. Priority phrases: multi-word phrases checked as case-insensitive
//!    substrings across every intent, in priority order. The first intent with
//!    a hit wins at [`PRIORITY_PHRASE_CONFIDENCE`], even for a bare phrase
//!    such as "who opened".
//! 2. Degenerate guard: fewer than [`MIN_MEANINGFUL_TOKENS`] meaningful tokens
//!    resolve to GENERAL with confidence 0.
//! 3. Keyword scoring: distinct ordinary-keyword hits per intent, normalized by
//!    [`KEYWORD_SATURATION`]. Ties go to the intent earlier in
//!    [`Intent::PRIORITY_ORDER`].
//! 4. Conversational fallback: a query with no keyword hits that matches a
//!    greeting or assistant-identity phrase is GENERAL at
//!    [`CONVERSATIONAL_CONFIDENCE`]; anything else is GENERAL at 0.
//!
//! Priority phrases exist because short generic keywords of one intent
//! (commit-adjacent words) otherwise outweigh a longer, more specific phrase
//! of another ("required steps before submitting a change" is governance).

use tracing::{debug, info};

use crate::models::{ClassificationMethod, Intent, IntentResult};
use crate::query::guards::normalize_query;
use crate::query::tokenizer::{meaningful_tokens, tokens};

pub const PRIORITY_PHRASE_CONFIDENCE: f64 = 0.85;
pub const CONVERSATIONAL_CONFIDENCE: f64 = 0.99;
pub const KEYWORD_SATURATION: f64 = 3.0;
pub const MIN_MEANINGFUL_TOKENS: usize = 2;

// ---------------------------------------------------------------------------
// Built-in lexicons
// ---------------------------------------------------------------------------

const GOVERNANCE_PHRASES: &[&str] = &[
    "required steps",
    "steps before",
    "before submitting",
    "what is the process",
    "what are the steps",
    "process for",
    "report a bug",
    "report an issue",
    "file a bug",
    "file an issue",
    "where to report",
    "how to report",
    "report a vulnerability",
    "report vulnerability",
    "security issue",
    "security reporting",
    "security policy",
    "who do i contact",
    "who should i contact",
    "how to contact",
    "get in touch",
    "contact maintainers",
    "contact the maintainers",
    "who maintains",
    "maintains the project",
    "how to contribute",
    "how do i contribute",
    "how can i contribute",
    "become a contributor",
    "start contributing",
    "contributing guide",
    "contribution guide",
    "voting rules",
    "decision process",
    "decision making",
    "technical decisions",
    "code of conduct",
    "commit message format",
    "pull request process",
    "governance model",
    "steering committee",
];

const GOVERNANCE_KEYWORDS: &[&str] = &[
    "maintainer",
    "maintainers",
    "maintains",
    "maintained",
    "governance",
    "contribute",
    "contributing",
    "contribution",
    "guideline",
    "guidelines",
    "policy",
    "policies",
    "license",
    "licensing",
    "security",
    "conduct",
    "community",
    "decision",
    "decisions",
    "voting",
    "vote",
    "leadership",
    "steering",
    "committee",
    "role",
    "roles",
    "responsibility",
    "responsibilities",
    "contact",
    "process",
    "procedure",
    "required",
    "rules",
    "charter",
    "trademark",
    "reviewer",
    "reviewers",
];

const ISSUES_PHRASES: &[&str] = &[
    "open issues",
    "closed issues",
    "issue tracker",
    "most commented",
    "comment count",
    "bug reports",
    "feature requests",
    "updated issues",
    "issue states",
    "who opened",
];

const ISSUES_KEYWORDS: &[&str] = &[
    "issue",
    "issues",
    "bug",
    "bugs",
    "ticket",
    "tickets",
    "problem",
    "problems",
    "reporter",
    "reporters",
    "comment",
    "comments",
    "discussion",
    "enhancement",
    "enhancements",
    "feature",
    "open",
    "closed",
    "resolved",
    "state",
    "states",
    "label",
    "labels",
];

const COMMITS_PHRASES: &[&str] = &[
    "commit history",
    "commit log",
    "latest commits",
    "recent commits",
    "top contributors",
    "most active contributor",
    "most active developer",
    "lines added",
    "lines deleted",
    "files changed",
    "most modified files",
    "who committed",
];

const COMMITS_KEYWORDS: &[&str] = &[
    "commit",
    "commits",
    "committed",
    "committer",
    "committers",
    "author",
    "authors",
    "contributor",
    "contributors",
    "changed",
    "changes",
    "modification",
    "modifications",
    "modified",
    "file",
    "files",
    "lines",
    "changelog",
    "active",
    "churn",
    "sha",
];

const CONVERSATIONAL_PHRASES: &[&str] = &[
    "who are you",
    "what are you",
    "tell me about yourself",
    "introduce yourself",
    "your name",
    "who made you",
    "who created you",
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "how are you",
    "nice to meet you",
    "what can you do",
    "what can you help",
    "can you help me",
    "thank you",
    "thanks",
];

// ---------------------------------------------------------------------------
// IntentLexicon
// ---------------------------------------------------------------------------

/// Priority phrases and ordinary keywords for one non-GENERAL intent.
#[derive(Debug, Clone)]
pub struct IntentLexicon {
    pub intent: Intent,
    pub priority_phrases: Vec<String>,
    pub keywords: Vec<String>,
}

impl IntentLexicon {
    pub fn new(intent: Intent, priority_phrases: &[&str], keywords: &[&str]) -> Self {
        Self {
            intent,
            priority_phrases: dedup_lowercase(priority_phrases),
            keywords: dedup_lowercase(keywords),
        }
    }

    fn phrase_hits(&self, normalized: &str) -> Vec<String> {
        self.priority_phrases
            .iter()
            .filter(|p| normalized.contains(p.as_str()))
            .cloned()
            .collect()
    }

    fn keyword_hits(&self, padded_tokens: &str) -> Vec<String> {
        self.keywords
            .iter()
            .filter(|k| padded_tokens.contains(&format!(" {k} ")))
            .cloned()
            .collect()
    }
}

fn dedup_lowercase(values: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let lowered = value.trim().to_lowercase();
        if !lowered.is_empty() && !out.contains(&lowered) {
            out.push(lowered);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// IntentClassifier
// ---------------------------------------------------------------------------

/// Deterministic keyword/phrase intent classifier. Never fails.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    lexicons: Vec<IntentLexicon>,
    conversational: Vec<String>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(
            vec![
                IntentLexicon::new(Intent::Governance, GOVERNANCE_PHRASES, GOVERNANCE_KEYWORDS),
                IntentLexicon::new(Intent::Issues, ISSUES_PHRASES, ISSUES_KEYWORDS),
                IntentLexicon::new(Intent::Commits, COMMITS_PHRASES, COMMITS_KEYWORDS),
            ],
            CONVERSATIONAL_PHRASES,
        )
    }
}

impl IntentClassifier {
    /// Build a classifier from custom lexicons. Lexicons are evaluated in
    /// [`Intent::PRIORITY_ORDER`] regardless of the order given; a GENERAL
    /// lexicon is ignored since GENERAL is the fallback.
    pub fn new(mut lexicons: Vec<IntentLexicon>, conversational: &[&str]) -> Self {
        lexicons.retain(|l| l.intent != Intent::General);
        lexicons.sort_by_key(|l| l.intent.priority_rank());
        Self {
            lexicons,
            conversational: dedup_lowercase(conversational),
        }
    }

    pub fn lexicons(&self) -> &[IntentLexicon] {
        &self.lexicons
    }

    pub fn classify(&self, query: &str) -> IntentResult {
        let normalized = normalize_query(query);

        for lexicon in &self.lexicons {
            let matched = lexicon.phrase_hits(&normalized);
            if !matched.is_empty() {
                info!(
                    "Priority phrase -> {} | matched: {:?}",
                    lexicon.intent, matched
                );
                return IntentResult::new(
                    lexicon.intent,
                    PRIORITY_PHRASE_CONFIDENCE,
                    matched,
                    ClassificationMethod::PriorityPhrase,
                );
            }
        }

        if meaningful_tokens(&normalized).len() < MIN_MEANINGFUL_TOKENS {
            debug!("Degenerate query, routing to GENERAL: {:?}", normalized);
            return IntentResult::unmatched(ClassificationMethod::Degenerate);
        }

        let padded = format!(" {} ", tokens(&normalized).join(" "));

        let mut best: Option<(Intent, Vec<String>)> = None;
        for lexicon in &self.lexicons {
            let hits = lexicon.keyword_hits(&padded);
            if hits.is_empty() {
                continue;
            }
            let better = match &best {
                Some((_, current)) => hits.len() > current.len(),
                None => true,
            };
            if better {
                best = Some((lexicon.intent, hits));
            }
        }

        if let Some((intent, hits)) = best {
            let confidence = hits.len() as f64 / KEYWORD_SATURATION;
            info!(
                "Keyword scoring -> {} ({:.2}) | matched: {:?}",
                intent, confidence, hits
            );
            return IntentResult::new(intent, confidence, hits, ClassificationMethod::KeywordScore);
        }

        let conversational: Vec<String> = self
            .conversational
            .iter()
            .filter(|p| padded.contains(&format!(" {p} ")))
            .cloned()
            .collect();
        if !conversational.is_empty() {
            debug!("Conversational query -> GENERAL | matched: {:?}", conversational);
            return IntentResult::new(
                Intent::General,
                CONVERSATIONAL_CONFIDENCE,
                conversational,
                ClassificationMethod::Conversational,
            );
        }

        debug!("No intent signal, routing to GENERAL: {:?}", normalized);
        IntentResult::unmatched(ClassificationMethod::NoMatch)
    }
}

/// Classify with the built-in lexicons.
pub fn classify_intent(query: &str) -> IntentResult {
    IntentClassifier::default().classify(query)
}
