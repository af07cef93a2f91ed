use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

/// Unit lifecycle. Printed and distributed are only ever set at the
/// batch level today; an individual unit moves straight from created to
/// activated when a customer scans its sticker, then to claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "unit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Created,
    Printed,
    Distributed,
    Activated,
    Claimed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductUnit {
    pub id: i32,
    pub product_id: i32,
    pub batch_id: i32,
    pub serial_key: String,
    pub qr_token: String,
    pub qr_code_url: String,
    pub status: UnitStatus,
    pub activated_at: Option<DateTime<Utc>>,
    pub warranty_expires_at: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub shop_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An unsaved unit produced by the factory. Identifiers are regenerated
/// by the persistence layer if an insert hits a unique constraint.
#[derive(Debug, Clone)]
pub struct NewProductUnit {
    pub product_id: i32,
    pub batch_id: i32,
    pub serial_key: String,
    pub qr_token: String,
    pub qr_code_url: String,
}

#[derive(Debug, Deserialize)]
pub struct UnitQuery {
    pub batch_id: Option<i32>,
    pub status: Option<UnitStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ActivateUnitRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Serialize)]
pub struct UnitSearchResponse {
    pub units: Vec<ProductUnit>,
    pub pagination: super::Pagination,
}

#[derive(Debug, Serialize)]
pub struct PublicUnitResponse {
    pub unit: ProductUnit,
    pub product: Product,
}

/// Warranty expiry uses calendar-month arithmetic, clamping to the last
/// day of shorter months (Jan 31 + 1 month = Feb 28/29).
pub fn warranty_expiry(activated_at: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    activated_at.checked_add_months(Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn twelve_month_warranty_lands_on_same_day_next_year() {
        let activated = Utc.with_ymd_and_hms(2024, 1, 20, 10, 30, 0).unwrap();
        let expires = warranty_expiry(activated, 12).unwrap();
        assert_eq!(expires, Utc.with_ymd_and_hms(2025, 1, 20, 10, 30, 0).unwrap());
    }

    #[test]
    fn expiry_clamps_to_end_of_shorter_month() {
        let activated = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let expires = warranty_expiry(activated, 1).unwrap();
        assert_eq!(expires, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }
}
