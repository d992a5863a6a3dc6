//! Immutable per-project snapshots behind a copy-on-write registry.
//!
//! Readers clone an `Arc<ProjectSnapshot>` and work on it lock-free; a reload
//! builds a new snapshot (sharing untouched parts by `Arc`) and swaps it in
//! under a short write lock. A reader therefore sees either the old or the
//! new snapshot, never a mix.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::store::corpus::Corpus;
use crate::store::dataset::{CommitDataset, IssueDataset};

#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub project_id: String,
    /// Monotonically increasing across the registry; bumps on every swap.
    pub version: u64,
    pub corpus: Option<Arc<Corpus>>,
    pub commits: Option<Arc<CommitDataset>>,
    pub issues: Option<Arc<IssueDataset>>,
}

impl ProjectSnapshot {
    fn empty(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            version: 0,
            corpus: None,
            commits: None,
            issues: None,
        }
    }

    pub fn available_data(&self) -> AvailableData {
        AvailableData {
            corpus: self.corpus.is_some(),
            commits: self.commits.is_some(),
            issues: self.issues.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AvailableData {
    pub corpus: bool,
    pub commits: bool,
    pub issues: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub projects: usize,
    pub documents: usize,
    pub commit_rows: usize,
    pub issue_rows: usize,
}

/// Everything a project load can replace in one swap. `None` keeps the
/// current value.
#[derive(Debug, Default)]
pub struct ProjectLoad {
    pub corpus: Option<Corpus>,
    pub commits: Option<CommitDataset>,
    pub issues: Option<IssueDataset>,
}

#[derive(Debug, Default)]
pub struct SnapshotRegistry {
    projects: RwLock<HashMap<String, Arc<ProjectSnapshot>>>,
    epoch: AtomicU64,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn swap(&self, project_id: &str, update: impl FnOnce(&mut ProjectSnapshot)) -> u64 {
        let mut projects = self.projects.write();
        let mut next = projects
            .get(project_id)
            .map(|current| ProjectSnapshot::clone(current))
            .unwrap_or_else(|| ProjectSnapshot::empty(project_id));
        update(&mut next);
        next.version = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let version = next.version;
        projects.insert(project_id.to_string(), Arc::new(next));
        version
    }

    /// Replace the project's corpus; returns the new snapshot version.
    pub fn replace_corpus(&self, corpus: Corpus) -> u64 {
        let project_id = corpus.project_id().to_string();
        let documents = corpus.len();
        let version = self.swap(&project_id, |snap| snap.corpus = Some(Arc::new(corpus)));
        info!(
            "Loaded corpus for {} ({} documents, version {})",
            project_id, documents, version
        );
        version
    }

    pub fn replace_commits(&self, project_id: &str, commits: CommitDataset) -> u64 {
        let rows = commits.len();
        let version = self.swap(project_id, |snap| snap.commits = Some(Arc::new(commits)));
        info!(
            "Loaded {} commit rows for {} (version {})",
            rows, project_id, version
        );
        version
    }

    pub fn replace_issues(&self, project_id: &str, issues: IssueDataset) -> u64 {
        let rows = issues.len();
        let version = self.swap(project_id, |snap| snap.issues = Some(Arc::new(issues)));
        info!(
            "Loaded {} issue rows for {} (version {})",
            rows, project_id, version
        );
        version
    }

    /// Replace several parts at once under a single version.
    pub fn load_project(&self, project_id: &str, load: ProjectLoad) -> u64 {
        let version = self.swap(project_id, |snap| {
            if let Some(corpus) = load.corpus {
                snap.corpus = Some(Arc::new(corpus));
            }
            if let Some(commits) = load.commits {
                snap.commits = Some(Arc::new(commits));
            }
            if let Some(issues) = load.issues {
                snap.issues = Some(Arc::new(issues));
            }
        });
        info!("Loaded project {} (version {})", project_id, version);
        version
    }

    pub fn snapshot(&self, project_id: &str) -> Option<Arc<ProjectSnapshot>> {
        self.projects.read().get(project_id).cloned()
    }

    pub fn remove_project(&self, project_id: &str) -> bool {
        let removed = self.projects.write().remove(project_id).is_some();
        if removed {
            info!("Removed project {}", project_id);
        }
        removed
    }

    /// Loaded project ids, sorted.
    pub fn project_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.projects.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn available_data(&self, project_id: &str) -> AvailableData {
        self.snapshot(project_id)
            .map(|snap| snap.available_data())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> RegistryStats {
        let projects = self.projects.read();
        projects.values().fold(
            RegistryStats {
                projects: projects.len(),
                ..RegistryStats::default()
            },
            |mut acc, snap| {
                acc.documents += snap.corpus.as_ref().map_or(0, |c| c.len());
                acc.commit_rows += snap.commits.as_ref().map_or(0, |c| c.len());
                acc.issue_rows += snap.issues.as_ref().map_or(0, |i| i.len());
                acc
            },
        )
    }
}
