//! Branch selector items and current selection.

use serde::{Deserialize, Serialize};

use super::paged::lenient_list;
use crate::navigation::RouteParams;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchItem {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BranchEdge {
    pub node: Option<BranchItem>,
}

/// A `branches` connection as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Branches {
    #[serde(default, deserialize_with = "lenient_list")]
    pub edges: Vec<Option<BranchEdge>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchSelection {
    /// Selectable branches, in response order.
    pub items: Vec<BranchItem>,
    /// The `branch` route param, else `ref`, else the default branch.
    pub selection: Option<BranchItem>,
}

pub fn branch_selector(
    branches: &Branches,
    default_branch: Option<&str>,
    route: &RouteParams,
) -> BranchSelection {
    let items = branches
        .edges
        .iter()
        .flatten()
        .filter_map(|edge| edge.node.clone())
        .collect();

    let selected = route
        .branch
        .as_deref()
        .or(route.reference.as_deref())
        .or(default_branch);

    BranchSelection {
        items,
        selection: selected.map(|name| BranchItem {
            name: name.to_string(),
        }),
    }
}

/// Route for viewing `name` from `route`. A `ref` param is dropped so the
/// picked branch is the one selected.
pub fn select_branch(route: &RouteParams, name: &str) -> RouteParams {
    RouteParams {
        branch: Some(name.to_string()),
        reference: None,
        ..route.clone()
    }
}
