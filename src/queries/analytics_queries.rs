use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Analytics, ProductUnit},
};

const RECENT_ACTIVATIONS: i64 = 5;

pub async fn gather(pool: &PgPool) -> Result<Analytics> {
    let total_products: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = TRUE")
            .fetch_one(pool)
            .await?;

    let total_units: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_units")
        .fetch_one(pool)
        .await?;

    let activated_units: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_units WHERE activated_at IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let warranty_expiring_soon: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM product_units
         WHERE warranty_expires_at BETWEEN NOW() AND NOW() + INTERVAL '30 days'",
    )
    .fetch_one(pool)
    .await?;

    let active_claims: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM warranty_claims WHERE status IN ('pending', 'approved', 'in_progress')",
    )
    .fetch_one(pool)
    .await?;

    let recent_activations = sqlx::query_as::<_, ProductUnit>(
        "SELECT * FROM product_units WHERE activated_at IS NOT NULL
         ORDER BY activated_at DESC LIMIT $1",
    )
    .bind(RECENT_ACTIVATIONS)
    .fetch_all(pool)
    .await?;

    let activation_rate = if total_units > 0 {
        activated_units as f64 / total_units as f64
    } else {
        0.0
    };

    Ok(Analytics {
        total_products,
        total_units,
        activated_units,
        activation_rate,
        warranty_expiring_soon,
        active_claims,
        recent_activations,
    })
}
