use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub model: String,
    pub warranty_duration_months: i32,
    pub image_url: Option<String>,
    pub specifications: serde_json::Value,
    pub is_active: bool,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub model: String,
    pub warranty_duration_months: i32,
    pub image_url: Option<String>,
    pub specifications: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub warranty_duration_months: Option<i32>,
    pub image_url: Option<String>,
    pub specifications: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// Normalizes client-supplied paging values: page starts at 1 and limit
/// is forced into 1..=max, so neither can reach LIMIT/OFFSET negative.
pub fn page_params(
    page: Option<i64>,
    limit: Option<i64>,
    default_limit: i64,
    max_limit: i64,
) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
    (page, limit)
}

#[derive(Debug, Serialize)]
pub struct ProductSearchResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_values_are_clamped_to_sane_bounds() {
        assert_eq!(page_params(None, None, 10, 100), (1, 10));
        assert_eq!(page_params(Some(-3), Some(0), 10, 100), (1, 1));
        assert_eq!(page_params(Some(1), Some(-5), 50, 500), (1, 1));
        assert_eq!(page_params(Some(2), Some(9999), 10, 100), (2, 100));
    }
}
