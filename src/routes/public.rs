use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ActivateUnitRequest, ProductUnit, PublicUnitResponse},
    queries::{batch_queries, product_queries, unit_queries},
};

/// Public unit lookup. The QR token in the path is the only credential.
pub async fn get_unit_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicUnitResponse>> {
    let unit = unit_queries::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| AppError::NotFound("No product found for this code".to_string()))?;

    let product = product_queries::find_by_id(&state.db, unit.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product details not found".to_string()))?;

    Ok(Json(PublicUnitResponse { unit, product }))
}

/// Binds the unit to a customer and starts the warranty clock. The update
/// is a compare-and-set on `activated_at`, so re-scanning an activated
/// sticker never overwrites the first customer's details.
pub async fn activate_unit(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ActivateUnitRequest>,
) -> Result<Json<ProductUnit>> {
    validate_activation(&payload)?;

    let unit = unit_queries::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| AppError::NotFound("No product found for this code".to_string()))?;

    if unit.activated_at.is_some() {
        return Err(AppError::AlreadyActivated);
    }

    let product = product_queries::find_by_id(&state.db, unit.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product details not found".to_string()))?;

    let activated = unit_queries::activate(
        &state.db,
        &token,
        &payload,
        product.warranty_duration_months,
    )
    .await?;

    batch_queries::mark_activated(&state.db, activated.batch_id).await?;

    tracing::info!(
        "Unit {} activated, warranty runs until {:?}",
        activated.serial_key,
        activated.warranty_expires_at
    );

    Ok(Json(activated))
}

fn validate_activation(payload: &ActivateUnitRequest) -> Result<()> {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, phone: &str) -> ActivateUnitRequest {
        ActivateUnitRequest {
            customer_name: name.to_string(),
            customer_email: email.to_string(),
            customer_phone: phone.to_string(),
        }
    }

    #[test]
    fn accepts_complete_customer_details() {
        assert!(validate_activation(&request("Ana", "ana@example.com", "+995555123456")).is_ok());
    }

    #[test]
    fn rejects_missing_or_malformed_fields() {
        assert!(validate_activation(&request(" ", "ana@example.com", "+995555123456")).is_err());
        assert!(validate_activation(&request("Ana", "not-an-email", "+995555123456")).is_err());
        assert!(validate_activation(&request("Ana", "ana@example.com", "")).is_err());
    }
}
