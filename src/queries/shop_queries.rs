use sqlx::PgPool;

use crate::{
    error::Result,
    models::{CreateShopRequest, Shop, UpdateShopRequest},
};

pub async fn create_shop(pool: &PgPool, req: &CreateShopRequest) -> Result<Shop> {
    let shop = sqlx::query_as::<_, Shop>(
        r#"
        INSERT INTO shops (name, address, phone, email, owner_name)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.address)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.owner_name)
    .fetch_one(pool)
    .await?;

    Ok(shop)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Shop>> {
    let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(shop)
}

pub async fn list_shops(pool: &PgPool) -> Result<Vec<Shop>> {
    let shops = sqlx::query_as::<_, Shop>("SELECT * FROM shops ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(shops)
}

pub async fn update_shop(pool: &PgPool, id: i32, req: &UpdateShopRequest) -> Result<Option<Shop>> {
    let shop = sqlx::query_as::<_, Shop>(
        r#"
        UPDATE shops
        SET
            name = COALESCE($1, name),
            address = COALESCE($2, address),
            phone = COALESCE($3, phone),
            email = COALESCE($4, email),
            owner_name = COALESCE($5, owner_name),
            status = COALESCE($6, status),
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.address)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.owner_name)
    .bind(req.status)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(shop)
}

pub async fn delete_shop(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM shops WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
