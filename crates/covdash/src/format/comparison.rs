//! Discriminated comparison sub-objects and the display cells derived from them.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Coverage percentage of a patch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTotals {
    pub percent_covered: Option<f64>,
}

/// Result of comparing two commits, tagged by `__typename`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "__typename")]
pub enum ComparisonResult {
    Comparison {
        #[serde(rename = "patchTotals")]
        patch_totals: Option<PatchTotals>,
    },
    MissingBaseCommit,
    MissingHeadCommit,
    MissingComparison,
    MissingBaseReport,
    MissingHeadReport,
    FirstPullRequest,
    /// Any discriminant this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ComparisonResult {
    /// The discriminant as sent by the backend.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Comparison { .. } => "Comparison",
            Self::MissingBaseCommit => "MissingBaseCommit",
            Self::MissingHeadCommit => "MissingHeadCommit",
            Self::MissingComparison => "MissingComparison",
            Self::MissingBaseReport => "MissingBaseReport",
            Self::MissingHeadReport => "MissingHeadReport",
            Self::FirstPullRequest => "FirstPullRequest",
            Self::Unknown => "Unknown",
        }
    }

    /// Patch coverage of a successful comparison; a null percentage counts as 0.
    pub fn patch_percentage(&self) -> Option<f64> {
        match self {
            Self::Comparison { patch_totals } => Some(
                patch_totals
                    .as_ref()
                    .and_then(|t| t.percent_covered)
                    .unwrap_or(0.0),
            ),
            _ => None,
        }
    }
}

/// Patch cell for an optional comparison: a number for `Comparison`, the
/// placeholder for every other discriminant or when the object is absent.
pub fn patch_cell(comparison: Option<&ComparisonResult>) -> Cell {
    comparison
        .and_then(ComparisonResult::patch_percentage)
        .map_or(Cell::Placeholder, Cell::Percent)
}

/// A numeric table cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Percent(f64),
    /// Rendered as `-`.
    Placeholder,
}

impl Cell {
    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(Self::Placeholder, Self::Percent)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Percent(v) => Some(*v),
            Self::Placeholder => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(v) => write!(f, "{v:.2}%"),
            Self::Placeholder => f.write_str("-"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Percent(v) => serializer.serialize_f64(*v),
            Self::Placeholder => serializer.serialize_str("-"),
        }
    }
}

/// Bundle analysis report presence marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BundleAnalysisReport {
    #[serde(rename = "__typename")]
    pub typename: Option<String>,
}

impl BundleAnalysisReport {
    pub fn is_present(&self) -> bool {
        self.typename.as_deref() == Some("BundleAnalysisReport")
    }
}

/// Upload status glyph. There is no third state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadGlyph {
    Present,
    Missing,
}

impl UploadGlyph {
    pub fn from_report(report: Option<&BundleAnalysisReport>) -> Self {
        if report.is_some_and(BundleAnalysisReport::is_present) {
            Self::Present
        } else {
            Self::Missing
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            Self::Present => '\u{2705}',
            Self::Missing => '\u{274C}',
        }
    }
}

impl fmt::Display for UploadGlyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Upload: {}", self.glyph())
    }
}

/// Difference between two coverage values, present only when both are.
///
/// Zero is a valid change and is kept.
pub fn coverage_change(current: Option<f64>, reference: Option<f64>) -> Option<f64> {
    match (current, reference) {
        (Some(current), Some(reference)) => Some(current - reference),
        _ => None,
    }
}
