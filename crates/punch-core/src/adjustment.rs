//! Manual time adjustments.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::ProjectId;

/// A manual, instantaneous correction to a project's accrued time.
///
/// Adjustments do not open or close intervals. They contribute
/// `delta_minutes * 60` seconds to the period containing their creation
/// timestamp. Negative deltas are allowed and may drive a period total
/// below zero; the operator is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub project_id: ProjectId,
    pub delta_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl Adjustment {
    /// The adjustment's contribution in seconds.
    #[must_use]
    pub const fn delta_seconds(&self) -> i64 {
        self.delta_minutes * 60
    }
}
