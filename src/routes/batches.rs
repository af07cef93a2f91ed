use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
};
use http::header;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        BatchQuery, BatchSearchResponse, CreateBatchRequest, ProductBatch, ProductUnit,
        TransitionBatchRequest,
    },
    queries::{batch_queries, product_queries, unit_queries},
    services::{
        pdf_service::{self, PageLayout, StickerPage},
        qr_service,
    },
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn search_batches(
    State(state): State<AppState>,
    Query(params): Query<BatchQuery>,
) -> Result<Json<BatchSearchResponse>> {
    let batches = batch_queries::search_batches(&state.db, params).await?;

    Ok(Json(batches))
}

pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductBatch>> {
    let batch = batch_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))?;

    Ok(Json(batch))
}

pub async fn create_batch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<Json<ProductBatch>> {
    if payload.batch_number.trim().is_empty() {
        return Err(AppError::BadRequest("batch_number is required".to_string()));
    }

    if payload.quantity <= 0 || payload.quantity as i64 > qr_service::MAX_BATCH_QUANTITY {
        return Err(AppError::InvalidQuantity(payload.quantity as i64));
    }

    let product = product_queries::find_by_id(&state.db, payload.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if !product.is_active {
        return Err(AppError::BadRequest(
            "Cannot create a batch for an inactive product".to_string(),
        ));
    }

    let created_by = extract_user_id(&claims)?;
    let batch = batch_queries::create_batch(&state.db, &payload, created_by).await?;

    tracing::info!(
        "Batch {} created for product {} ({} units)",
        batch.batch_number,
        batch.product_id,
        batch.quantity
    );

    Ok(Json(batch))
}

/// Fans the batch out into individual units. Generation is resumable
/// and serialized per batch: the query layer locks the batch row, so a
/// partially persisted earlier run is reconciled rather than duplicated
/// and concurrent requests cannot overshoot the declared quantity.
pub async fn generate_units(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ProductUnit>>> {
    let stored = unit_queries::generate_for_batch(&state.db, id, &state.public_url).await?;

    tracing::info!("Generated {} units for batch {}", stored.len(), id);

    Ok(Json(stored))
}

pub async fn transition_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TransitionBatchRequest>,
) -> Result<Json<ProductBatch>> {
    let batch = batch_queries::transition(&state.db, id, payload.status).await?;

    tracing::info!(
        "Batch {} moved to {}",
        batch.batch_number,
        batch.status.as_str()
    );

    Ok(Json(batch))
}

pub async fn sticker_preview(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<StickerPage>>> {
    if batch_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound("Batch not found".to_string()));
    }

    let units = unit_queries::find_by_batch(&state.db, id).await?;
    let pages = pdf_service::layout_stickers(&units, PageLayout::default());

    Ok(Json(pages))
}

pub async fn download_pdf(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let batch = batch_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))?;

    let product = product_queries::find_by_id(&state.db, batch.product_id).await?;
    let units = unit_queries::find_by_batch(&state.db, id).await?;

    if units.is_empty() {
        return Err(AppError::BadRequest(
            "Batch has no generated units to print".to_string(),
        ));
    }

    let bytes = pdf_service::generate_batch_pdf(
        &units,
        &batch.batch_number,
        product.as_ref().map(|p| p.name.as_str()),
        &state.public_url,
    )?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"QR_Codes_{}.pdf\"",
                    batch.batch_number
                ),
            ),
        ],
        bytes,
    ))
}
