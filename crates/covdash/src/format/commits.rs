use serde::Serialize;

use super::comparison::{Cell, UploadGlyph, coverage_change, patch_cell};
use super::paged::PagedCollection;
use crate::services::Author;
use crate::services::commits::{Commit, CommitsPage};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitTitle {
    pub message: Option<String>,
    pub author: Option<Author>,
    pub commitid: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CiStatus {
    pub ci_passed: Option<bool>,
    pub commitid: String,
    /// Patch coverage; absent when the comparison did not succeed.
    pub coverage: Option<f64>,
}

/// One row of the commits table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRow {
    pub title: CommitTitle,
    pub coverage: Cell,
    pub ci_status: CiStatus,
    pub patch: Cell,
    pub change: Option<f64>,
    pub bundle_analysis: UploadGlyph,
}

pub fn create_commits_table_data(collection: &PagedCollection<CommitsPage>) -> Vec<CommitRow> {
    collection
        .iter()
        .flat_map(|page| page.commits.iter().flatten())
        .map(commit_row)
        .collect()
}

fn commit_row(commit: &Commit) -> CommitRow {
    let patch_percentage = commit
        .compare_with_parent
        .as_ref()
        .and_then(|c| c.patch_percentage());
    let coverage = commit.totals.as_ref().and_then(|t| t.coverage);
    let parent_coverage = commit
        .parent
        .as_ref()
        .and_then(|p| p.totals.as_ref())
        .and_then(|t| t.coverage);

    CommitRow {
        title: CommitTitle {
            message: commit.message.clone(),
            author: commit.author.clone(),
            commitid: commit.commitid.clone(),
            created_at: commit.created_at.clone(),
        },
        coverage: Cell::from_option(coverage),
        ci_status: CiStatus {
            ci_passed: commit.ci_passed,
            commitid: commit.commitid.clone(),
            coverage: patch_percentage,
        },
        patch: patch_cell(commit.compare_with_parent.as_ref()),
        change: coverage_change(coverage, parent_coverage),
        bundle_analysis: UploadGlyph::from_report(commit.bundle_analysis_report.as_ref()),
    }
}
