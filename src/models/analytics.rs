use serde::Serialize;

use super::ProductUnit;

#[derive(Debug, Serialize)]
pub struct Analytics {
    pub total_products: i64,
    pub total_units: i64,
    pub activated_units: i64,
    pub activation_rate: f64,
    pub warranty_expiring_soon: i64,
    pub active_claims: i64,
    pub recent_activations: Vec<ProductUnit>,
}
