use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{
        page_params, ClaimQuery, ClaimSearchResponse, CreateClaimRequest, Pagination,
        UpdateClaimStatusRequest, WarrantyClaim,
    },
};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn create_claim(
    pool: &PgPool,
    product_unit_id: i32,
    req: &CreateClaimRequest,
) -> Result<WarrantyClaim> {
    let claim = sqlx::query_as::<_, WarrantyClaim>(
        r#"
        INSERT INTO warranty_claims (
            product_unit_id, claim_type, description,
            customer_name, customer_email, customer_phone
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(product_unit_id)
    .bind(req.claim_type)
    .bind(&req.description)
    .bind(&req.customer_name)
    .bind(&req.customer_email)
    .bind(&req.customer_phone)
    .fetch_one(pool)
    .await?;

    Ok(claim)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<WarrantyClaim>> {
    let claim = sqlx::query_as::<_, WarrantyClaim>("SELECT * FROM warranty_claims WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(claim)
}

pub async fn search_claims(pool: &PgPool, params: ClaimQuery) -> Result<ClaimSearchResponse> {
    let (page, limit) = page_params(params.page, params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT *, COUNT(*) OVER() as total_count FROM warranty_claims WHERE 1=1",
    );

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
        claim: WarrantyClaim,
        total_count: i64,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let claims = results.into_iter().map(|r| r.claim).collect();

    Ok(ClaimSearchResponse {
        claims,
        pagination: Pagination::new(page, limit, total),
    })
}

/// Claim lifecycle moves are validated against the state machine, then
/// applied with a conditional UPDATE so concurrent decisions cannot
/// overwrite each other.
pub async fn update_status(
    pool: &PgPool,
    id: i32,
    req: &UpdateClaimStatusRequest,
) -> Result<WarrantyClaim> {
    let claim = find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Claim {} not found", id)))?;

    if !claim.status.can_transition_to(req.status) {
        return Err(AppError::InvalidTransition(format!(
            "Claim cannot move from {} to {}",
            claim.status.as_str(),
            req.status.as_str()
        )));
    }

    let updated = sqlx::query_as::<_, WarrantyClaim>(
        r#"
        UPDATE warranty_claims
        SET
            status = $2,
            resolution = COALESCE($3, resolution),
            assigned_to = COALESCE($4, assigned_to),
            updated_at = NOW()
        WHERE id = $1 AND status = $5
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.status)
    .bind(&req.resolution)
    .bind(req.assigned_to)
    .bind(claim.status)
    .fetch_optional(pool)
    .await?;

    updated.ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "Claim status changed concurrently, cannot move to {}",
            req.status.as_str()
        ))
    })
}
