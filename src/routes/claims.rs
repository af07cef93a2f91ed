use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        ClaimQuery, ClaimResponse, ClaimSearchResponse, CreateClaimRequest,
        UpdateClaimStatusRequest, WarrantyClaim,
    },
    queries::{claim_queries, unit_queries},
};

/// Public claim filing, keyed by the unit's QR token. Only activated
/// units with a running warranty can be claimed against.
pub async fn create_claim(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<CreateClaimRequest>,
) -> Result<Json<WarrantyClaim>> {
    validate_claim(&payload)?;

    let unit = unit_queries::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| AppError::NotFound("No product found for this code".to_string()))?;

    if unit.activated_at.is_none() {
        return Err(AppError::BadRequest(
            "Warranty must be activated before filing a claim".to_string(),
        ));
    }

    if let Some(expires_at) = unit.warranty_expires_at {
        if expires_at < chrono::Utc::now() {
            return Err(AppError::BadRequest(
                "Warranty for this product has expired".to_string(),
            ));
        }
    }

    let claim = claim_queries::create_claim(&state.db, unit.id, &payload).await?;

    unit_queries::mark_claimed(&state.db, unit.id).await?;

    tracing::info!(
        "Claim {} filed for unit {} ({:?})",
        claim.id,
        unit.serial_key,
        claim.claim_type
    );

    Ok(Json(claim))
}

pub async fn search_claims(
    State(state): State<AppState>,
    Query(params): Query<ClaimQuery>,
) -> Result<Json<ClaimSearchResponse>> {
    let claims = claim_queries::search_claims(&state.db, params).await?;

    Ok(Json(claims))
}

pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClaimResponse>> {
    let claim = claim_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Claim not found".to_string()))?;

    let product_unit = unit_queries::find_by_id(&state.db, claim.product_unit_id).await?;

    Ok(Json(ClaimResponse {
        claim,
        product_unit,
    }))
}

pub async fn update_claim_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateClaimStatusRequest>,
) -> Result<Json<WarrantyClaim>> {
    let claim = claim_queries::update_status(&state.db, id, &payload).await?;

    tracing::info!("Claim {} moved to {}", claim.id, claim.status.as_str());

    Ok(Json(claim))
}

fn validate_claim(payload: &CreateClaimRequest) -> Result<()> {
    if payload.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Claim description cannot be empty".to_string(),
        ));
    }

    if payload.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Customer name cannot be empty".to_string(),
        ));
    }

    if payload.customer_email.is_empty() || !payload.customer_email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    if payload.customer_phone.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Customer phone cannot be empty".to_string(),
        ));
    }

    Ok(())
}
