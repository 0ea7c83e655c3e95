use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a shipper answered an assignment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentResponse {
    Pending,
    Accepted,
    Rejected,
    Timeout,
}

/// One row of the assignment audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentRecord {
    pub order_id: String,
    pub shipper_id: String,
    pub assigned_at: DateTime<Utc>,
    pub response: AssignmentResponse,
    pub responded_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl AssignmentRecord {
    pub fn pending(order_id: impl Into<String>, shipper_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            order_id: order_id.into(),
            shipper_id: shipper_id.into(),
            assigned_at: at,
            response: AssignmentResponse::Pending,
            responded_at: None,
            note: None,
        }
    }

    /// Rejections and timeouts keep the shipper out of later attempts on the same order.
    pub fn declined(&self) -> bool {
        matches!(self.response, AssignmentResponse::Rejected | AssignmentResponse::Timeout)
    }
}
