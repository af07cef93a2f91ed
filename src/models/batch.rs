use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

/// Batch lifecycle. Batches only move forward:
/// created -> printed -> distributed, with activated reachable from
/// printed or distributed once units begin activating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "batch_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Created,
    Printed,
    Distributed,
    Activated,
}

impl BatchStatus {
    pub fn can_transition_to(self, target: BatchStatus) -> bool {
        matches!(
            (self, target),
            (BatchStatus::Created, BatchStatus::Printed)
                | (BatchStatus::Printed, BatchStatus::Distributed)
                | (BatchStatus::Printed, BatchStatus::Activated)
                | (BatchStatus::Distributed, BatchStatus::Activated)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Created => "created",
            BatchStatus::Printed => "printed",
            BatchStatus::Distributed => "distributed",
            BatchStatus::Activated => "activated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductBatch {
    pub id: i32,
    pub product_id: i32,
    pub batch_number: String,
    pub quantity: i32,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub status: BatchStatus,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    pub search: Option<String>,
    pub status: Option<BatchStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    pub product_id: i32,
    pub batch_number: String,
    pub quantity: i32,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionBatchRequest {
    pub status: BatchStatus,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    #[serde(flatten)]
    pub batch: ProductBatch,
    pub product: Option<Product>,
}

#[derive(Debug, Serialize)]
pub struct BatchSearchResponse {
    pub batches: Vec<BatchResponse>,
    pub pagination: super::Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_moves_forward_one_step() {
        assert!(BatchStatus::Created.can_transition_to(BatchStatus::Printed));
        assert!(BatchStatus::Printed.can_transition_to(BatchStatus::Distributed));
        assert!(BatchStatus::Distributed.can_transition_to(BatchStatus::Activated));
    }

    #[test]
    fn activated_is_reachable_from_printed() {
        assert!(BatchStatus::Printed.can_transition_to(BatchStatus::Activated));
    }

    #[test]
    fn batch_cannot_skip_printing() {
        assert!(!BatchStatus::Created.can_transition_to(BatchStatus::Distributed));
        assert!(!BatchStatus::Created.can_transition_to(BatchStatus::Activated));
    }

    #[test]
    fn batch_never_moves_backward_or_stays() {
        for status in [
            BatchStatus::Created,
            BatchStatus::Printed,
            BatchStatus::Distributed,
            BatchStatus::Activated,
        ] {
            assert!(!status.can_transition_to(status));
        }
        assert!(!BatchStatus::Printed.can_transition_to(BatchStatus::Created));
        assert!(!BatchStatus::Distributed.can_transition_to(BatchStatus::Printed));
        assert!(!BatchStatus::Activated.can_transition_to(BatchStatus::Distributed));
        assert!(!BatchStatus::Activated.can_transition_to(BatchStatus::Created));
    }
}
