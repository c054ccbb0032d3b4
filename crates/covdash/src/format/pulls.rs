use serde::Serialize;

use super::comparison::{Cell, UploadGlyph, patch_cell};
use super::paged::PagedCollection;
use crate::services::Author;
use crate::services::pulls::{Pull, PullState, PullsPage};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullTitle {
    pub author: Option<Author>,
    pub pull_id: i64,
    pub title: Option<String>,
    pub updatestamp: Option<String>,
    /// Discriminant of the base comparison, e.g. `MissingBaseCommit`.
    pub compare_with_base_type: Option<&'static str>,
}

/// One row of the pulls table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRow {
    pub title: PullTitle,
    pub state: Option<PullState>,
    pub patch: Cell,
    pub bundle_analysis: UploadGlyph,
}

pub fn create_pulls_table_team_data(collection: &PagedCollection<PullsPage>) -> Vec<PullRow> {
    collection
        .iter()
        .flat_map(|page| page.pulls.iter().flatten())
        .map(pull_row)
        .collect()
}

fn pull_row(pull: &Pull) -> PullRow {
    let report = pull
        .head
        .as_ref()
        .and_then(|head| head.bundle_analysis_report.as_ref());

    PullRow {
        title: PullTitle {
            author: pull.author.clone(),
            pull_id: pull.pull_id,
            title: pull.title.clone(),
            updatestamp: pull.updatestamp.clone(),
            compare_with_base_type: pull.compare_with_base.as_ref().map(|c| c.type_name()),
        },
        state: pull.state,
        patch: patch_cell(pull.compare_with_base.as_ref()),
        bundle_analysis: UploadGlyph::from_report(report),
    }
}
