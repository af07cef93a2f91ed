use chrono::Utc;
use sqlx::{Connection, PgConnection, PgPool};

use crate::{
    error::{AppError, Result},
    models::{
        page_params, warranty_expiry, ActivateUnitRequest, BatchStatus, NewProductUnit,
        Pagination, ProductBatch, ProductUnit, UnitQuery, UnitSearchResponse,
    },
    services::qr_service,
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

// How often we re-roll a unit's identifiers after a unique-constraint
// collision before giving up.
const MAX_IDENTIFIER_RETRIES: usize = 3;

async fn insert_unit(conn: &mut PgConnection, unit: &NewProductUnit) -> Result<ProductUnit> {
    let stored = sqlx::query_as::<_, ProductUnit>(
        r#"
        INSERT INTO product_units (product_id, batch_id, serial_key, qr_token, qr_code_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(unit.product_id)
    .bind(unit.batch_id)
    .bind(&unit.serial_key)
    .bind(&unit.qr_token)
    .bind(&unit.qr_code_url)
    .fetch_one(&mut *conn)
    .await?;

    Ok(stored)
}

/// Persists factory output one unit at a time. A colliding serial key or
/// QR token only costs that unit a regeneration, not the whole batch.
/// Each attempt runs in its own savepoint, so a unique violation does
/// not abort the surrounding transaction before the retry.
async fn insert_units(
    conn: &mut PgConnection,
    units: Vec<NewProductUnit>,
    public_url: &str,
) -> Result<Vec<ProductUnit>> {
    let mut stored = Vec::with_capacity(units.len());

    for mut unit in units {
        let mut attempts = 0;
        loop {
            let mut savepoint = conn.begin().await?;
            match insert_unit(&mut savepoint, &unit).await {
                Ok(row) => {
                    savepoint.commit().await?;
                    stored.push(row);
                    break;
                }
                Err(AppError::DuplicateIdentifier(constraint))
                    if attempts < MAX_IDENTIFIER_RETRIES =>
                {
                    savepoint.rollback().await?;
                    attempts += 1;
                    tracing::warn!(
                        "Identifier collision on {} (attempt {}), regenerating",
                        constraint,
                        attempts
                    );
                    qr_service::regenerate_identifiers(&mut unit, public_url);
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(stored)
}

/// Expands a batch into its missing units inside one transaction. The
/// batch row is locked first, so concurrent generation requests for the
/// same batch serialize and the unit count can never exceed the
/// declared quantity. Generation stays resumable: only the units missing
/// from the declared quantity are created. A batch that is still in the
/// created state moves to printed once its full quantity exists.
pub async fn generate_for_batch(
    pool: &PgPool,
    batch_id: i32,
    public_url: &str,
) -> Result<Vec<ProductUnit>> {
    let mut tx = pool.begin().await?;

    let batch = sqlx::query_as::<_, ProductBatch>(
        "SELECT * FROM product_batches WHERE id = $1 FOR UPDATE",
    )
    .bind(batch_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))?;

    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_units WHERE batch_id = $1")
            .bind(batch_id)
            .fetch_one(&mut *tx)
            .await?;

    let remaining = batch.quantity as i64 - existing;
    if remaining <= 0 {
        return Err(AppError::Conflict(
            "All units for this batch have already been generated".to_string(),
        ));
    }

    let new_units =
        qr_service::generate_units(batch.product_id, batch.id, remaining, public_url)?;
    let stored = insert_units(&mut tx, new_units, public_url).await?;

    if batch.status == BatchStatus::Created {
        sqlx::query(
            "UPDATE product_batches SET status = 'printed', updated_at = NOW()
             WHERE id = $1 AND status = 'created'",
        )
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(stored)
}

pub async fn find_by_batch(pool: &PgPool, batch_id: i32) -> Result<Vec<ProductUnit>> {
    let units = sqlx::query_as::<_, ProductUnit>(
        "SELECT * FROM product_units WHERE batch_id = $1 ORDER BY id",
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await?;

    Ok(units)
}

pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<ProductUnit>> {
    let unit = sqlx::query_as::<_, ProductUnit>("SELECT * FROM product_units WHERE qr_token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    Ok(unit)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<ProductUnit>> {
    let unit = sqlx::query_as::<_, ProductUnit>("SELECT * FROM product_units WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(unit)
}

pub async fn search_units(pool: &PgPool, params: UnitQuery) -> Result<UnitSearchResponse> {
    let (page, limit) = page_params(params.page, params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT *, COUNT(*) OVER() as total_count FROM product_units WHERE 1=1",
    );

    if let Some(batch_id) = params.batch_id {
        query_builder.push(" AND batch_id = ");
        query_builder.push_bind(batch_id);
    }

    if let Some(status) = params.status {
        query_builder.push(" AND status = ");
        query_builder.push_bind(status);
    }

    query_builder.push(" ORDER BY created_at DESC");
    query_builder.push(" LIMIT ");
    query_builder.push_bind(limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    #[derive(sqlx::FromRow)]
    struct SearchResult {
        #[sqlx(flatten)]
        unit: ProductUnit,
        total_count: i64,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let units = results.into_iter().map(|r| r.unit).collect();

    Ok(UnitSearchResponse {
        units,
        pagination: Pagination::new(page, limit, total),
    })
}

/// Activation is a compare-and-set keyed on the token: the predicate
/// `activated_at IS NULL` guarantees that of two concurrent requests
/// exactly one succeeds, and that customer fields are written once.
pub async fn activate(
    pool: &PgPool,
    token: &str,
    req: &ActivateUnitRequest,
    warranty_months: i32,
) -> Result<ProductUnit> {
    let activated_at = Utc::now();
    let expires_at = warranty_expiry(activated_at, warranty_months.max(0) as u32)
        .ok_or_else(|| AppError::InternalError("Warranty expiry out of range".to_string()))?;

    let updated = sqlx::query_as::<_, ProductUnit>(
        r#"
        UPDATE product_units
        SET
            status = 'activated',
            activated_at = $2,
            warranty_expires_at = $3,
            customer_name = $4,
            customer_email = $5,
            customer_phone = $6,
            updated_at = NOW()
        WHERE qr_token = $1 AND activated_at IS NULL
        RETURNING *
        "#,
    )
    .bind(token)
    .bind(activated_at)
    .bind(expires_at)
    .bind(&req.customer_name)
    .bind(&req.customer_email)
    .bind(&req.customer_phone)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(unit) => Ok(unit),
        None => {
            if find_by_token(pool, token).await?.is_some() {
                Err(AppError::AlreadyActivated)
            } else {
                Err(AppError::NotFound(
                    "No product found for this code".to_string(),
                ))
            }
        }
    }
}

/// Flips an activated unit to claimed when a warranty claim is filed.
/// Returns false if the unit was not in the activated state.
pub async fn mark_claimed(pool: &PgPool, unit_id: i32) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE product_units SET status = 'claimed', updated_at = NOW()
         WHERE id = $1 AND status = 'activated'",
    )
    .bind(unit_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("failed to connect");
        sqlx::migrate!().run(&pool).await.ok();
        pool
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres at DATABASE_URL"]
    async fn concurrent_generation_never_exceeds_batch_quantity() {
        let pool = test_pool().await;
        let tag = qr_service::generate_qr_token();

        let user_id: i32 = sqlx::query_scalar(
            "INSERT INTO users (email, name, password, role)
             VALUES ($1, 'Generation Test', 'x', 'admin') RETURNING id",
        )
        .bind(format!("{}@test.local", tag))
        .fetch_one(&pool)
        .await
        .unwrap();

        let product_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO products (
                name, description, category, brand, model,
                warranty_duration_months, created_by
            )
            VALUES ('Generation Test', 'test', 'test', 'test', 'test', 12, $1)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();

        let batch_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO product_batches (
                product_id, batch_number, quantity, manufacturing_date, created_by
            )
            VALUES ($1, $2, 25, CURRENT_DATE, $3)
            RETURNING id
            "#,
        )
        .bind(product_id)
        .bind(&tag)
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();

        let url = "https://warranty.example.com";
        let (a, b) = tokio::join!(
            generate_for_batch(&pool, batch_id, url),
            generate_for_batch(&pool, batch_id, url),
        );
        assert!(
            a.is_ok() != b.is_ok(),
            "exactly one of two concurrent requests should generate"
        );

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_units WHERE batch_id = $1")
                .bind(batch_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 25);
    }
}
