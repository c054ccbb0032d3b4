use serde::Serialize;

use crate::services::plan::{AccountDetails, PlanPageData};

/// Upload allowance of the basic plan over the trailing 30 days.
pub const MAX_UPLOADS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUsage {
    pub uploads: Option<u64>,
    /// `uploads * 100 / 250`, 0 when the count is unknown.
    pub progress: f64,
    pub exceeded: bool,
}

impl UploadUsage {
    pub fn new(uploads: Option<u64>) -> Self {
        let progress = uploads.map_or(0.0, |n| n as f64 * 100.0 / MAX_UPLOADS as f64);
        Self {
            uploads,
            progress,
            exceeded: uploads.is_some_and(|n| n >= MAX_UPLOADS),
        }
    }

    pub fn label(&self) -> String {
        let uploads = self.uploads.map_or_else(|| "-".to_string(), |n| n.to_string());
        format!("{uploads} of {MAX_UPLOADS} uploads - trailing 30 days")
    }
}

/// Usage card of the current plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    /// `X of Y users`
    pub active_users: String,
    /// Only tracked on the basic plan.
    pub uploads: Option<UploadUsage>,
}

pub fn create_usage_summary(
    account: &AccountDetails,
    plan_data: Option<&PlanPageData>,
    is_basic_plan: bool,
) -> UsageSummary {
    let active = account.activated_user_count.unwrap_or(0);
    let quantity = account.plan.quantity.unwrap_or(0);

    UsageSummary {
        active_users: format!("{active} of {quantity} users"),
        uploads: is_basic_plan
            .then(|| UploadUsage::new(plan_data.and_then(|d| d.number_of_uploads))),
    }
}
