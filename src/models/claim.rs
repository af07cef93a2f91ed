use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProductUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "claim_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Repair,
    Replacement,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl ClaimStatus {
    pub fn can_transition_to(self, target: ClaimStatus) -> bool {
        matches!(
            (self, target),
            (ClaimStatus::Pending, ClaimStatus::Approved)
                | (ClaimStatus::Pending, ClaimStatus::Rejected)
                | (ClaimStatus::Approved, ClaimStatus::InProgress)
                | (ClaimStatus::InProgress, ClaimStatus::Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::InProgress => "in_progress",
            ClaimStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WarrantyClaim {
    pub id: i32,
    pub product_unit_id: i32,
    pub claim_type: ClaimType,
    pub description: String,
    pub status: ClaimStatus,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub resolution: Option<String>,
    pub assigned_to: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    pub claim_type: ClaimType,
    pub description: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimQuery {
    pub status: Option<ClaimStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClaimStatusRequest {
    pub status: ClaimStatus,
    pub resolution: Option<String>,
    pub assigned_to: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    #[serde(flatten)]
    pub claim: WarrantyClaim,
    pub product_unit: Option<ProductUnit>,
}

#[derive(Debug, Serialize)]
pub struct ClaimSearchResponse {
    pub claims: Vec<WarrantyClaim>,
    pub pagination: super::Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_claims_can_be_decided_either_way() {
        assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Approved));
        assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Rejected));
    }

    #[test]
    fn approved_claims_progress_to_completion() {
        assert!(ClaimStatus::Approved.can_transition_to(ClaimStatus::InProgress));
        assert!(ClaimStatus::InProgress.can_transition_to(ClaimStatus::Completed));
    }

    #[test]
    fn terminal_and_backward_moves_are_rejected() {
        assert!(!ClaimStatus::Rejected.can_transition_to(ClaimStatus::Approved));
        assert!(!ClaimStatus::Completed.can_transition_to(ClaimStatus::InProgress));
        assert!(!ClaimStatus::Approved.can_transition_to(ClaimStatus::Pending));
        assert!(!ClaimStatus::Pending.can_transition_to(ClaimStatus::Completed));
    }
}
