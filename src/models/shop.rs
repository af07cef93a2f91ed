use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shop_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShopStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shop {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub owner_name: String,
    pub status: ShopStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateShopRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub owner_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShopRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub owner_name: Option<String>,
    pub status: Option<ShopStatus>,
}
