use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{
        page_params, BatchQuery, BatchResponse, BatchSearchResponse, BatchStatus,
        CreateBatchRequest, Pagination, Product, ProductBatch,
    },
};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn create_batch(
    pool: &PgPool,
    req: &CreateBatchRequest,
    created_by: i32,
) -> Result<ProductBatch> {
    let batch = sqlx::query_as::<_, ProductBatch>(
        r#"
        INSERT INTO product_batches (
            product_id, batch_number, quantity, manufacturing_date, expiry_date, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(req.product_id)
    .bind(&req.batch_number)
    .bind(req.quantity)
    .bind(req.manufacturing_date)
    .bind(req.expiry_date)
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    Ok(batch)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<ProductBatch>> {
    let batch = sqlx::query_as::<_, ProductBatch>("SELECT * FROM product_batches WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(batch)
}

pub async fn search_batches(pool: &PgPool, params: BatchQuery) -> Result<BatchSearchResponse> {
    let (page, limit) = page_params(params.page, params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT *, COUNT(*) OVER() as total_count FROM product_batches WHERE 1=1",
    );

    if let Some(ref search) = params.search {
        query_builder.push(" AND batch_number ILIKE ");
        query_builder.push_bind(format!("%{}%", search));
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
        batch: ProductBatch,
        total_count: i64,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let batches: Vec<ProductBatch> = results.into_iter().map(|r| r.batch).collect();

    let product_ids: Vec<i32> = batches.iter().map(|b| b.product_id).collect();
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(&product_ids)
        .fetch_all(pool)
        .await?;
    let products_map: HashMap<i32, Product> =
        products.into_iter().map(|p| (p.id, p)).collect();

    let batches = batches
        .into_iter()
        .map(|batch| {
            let product = products_map.get(&batch.product_id).cloned();
            BatchResponse { batch, product }
        })
        .collect();

    Ok(BatchSearchResponse {
        batches,
        pagination: Pagination::new(page, limit, total),
    })
}

/// Moves a batch forward through its lifecycle. The UPDATE is conditional
/// on the status we read, so a concurrent transition cannot be skipped
/// over or undone.
pub async fn transition(pool: &PgPool, id: i32, target: BatchStatus) -> Result<ProductBatch> {
    let batch = find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", id)))?;

    if !batch.status.can_transition_to(target) {
        return Err(AppError::InvalidTransition(format!(
            "Batch cannot move from {} to {}",
            batch.status.as_str(),
            target.as_str()
        )));
    }

    let updated = sqlx::query_as::<_, ProductBatch>(
        "UPDATE product_batches SET status = $2, updated_at = NOW() WHERE id = $1 AND status = $3 RETURNING *",
    )
    .bind(id)
    .bind(target)
    .bind(batch.status)
    .fetch_optional(pool)
    .await?;

    updated.ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "Batch status changed concurrently, cannot move to {}",
            target.as_str()
        ))
    })
}

/// Batch-level rollup once its units start activating. A no-op when the
/// batch is not yet printed or already activated.
pub async fn mark_activated(pool: &PgPool, id: i32) -> Result<()> {
    sqlx::query(
        "UPDATE product_batches SET status = 'activated', updated_at = NOW()
         WHERE id = $1 AND status IN ('printed', 'distributed')",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}
