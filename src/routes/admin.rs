use axum::{
    Json,
    extract::{Extension, Path, State},
};

use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{CreateProductRequest, CreateShopRequest, Product, Shop, UpdateProductRequest,
        UpdateShopRequest},
    queries::{product_queries, shop_queries},
    utils::{extractors::extract_user_id, jwt::Claims},
};

// PRODUCT ROUTES

pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<Product>> {
    validate_product(&payload)?;

    let created_by = extract_user_id(&claims)?;
    let product = product_queries::create_product(&state.db, &payload, created_by).await?;

    tracing::info!("Product {} created by user {}", product.id, created_by);

    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Product with id {} not found",
            id
        )));
    }

    if let Some(months) = payload.warranty_duration_months {
        if !(1..=120).contains(&months) {
            return Err(AppError::BadRequest(
                "warranty_duration_months must be between 1 and 120".to_string(),
            ));
        }
    }

    let product = product_queries::update_product(&state.db, id, &payload).await?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let deleted = product_queries::deactivate_product(&state.db, id).await?;

    if deleted == 0 {
        return Err(AppError::NotFound(format!(
            "Product with id {} not found",
            id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn validate_product(payload: &CreateProductRequest) -> Result<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    if payload.brand.trim().is_empty() {
        return Err(AppError::BadRequest("brand is required".to_string()));
    }

    if payload.model.trim().is_empty() {
        return Err(AppError::BadRequest("model is required".to_string()));
    }

    if !(1..=120).contains(&payload.warranty_duration_months) {
        return Err(AppError::BadRequest(
            "warranty_duration_months must be between 1 and 120".to_string(),
        ));
    }

    Ok(())
}

// SHOP ROUTES

pub async fn list_shops(State(state): State<AppState>) -> Result<Json<Vec<Shop>>> {
    let shops = shop_queries::list_shops(&state.db).await?;

    Ok(Json(shops))
}

pub async fn get_shop(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Shop>> {
    let shop = shop_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop not found".to_string()))?;

    Ok(Json(shop))
}

pub async fn create_shop(
    State(state): State<AppState>,
    Json(payload): Json<CreateShopRequest>,
) -> Result<Json<Shop>> {
    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let shop = shop_queries::create_shop(&state.db, &payload).await?;

    Ok(Json(shop))
}

pub async fn update_shop(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateShopRequest>,
) -> Result<Json<Shop>> {
    let shop = shop_queries::update_shop(&state.db, id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop not found".to_string()))?;

    Ok(Json(shop))
}

pub async fn delete_shop(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    let deleted = shop_queries::delete_shop(&state.db, id).await?;

    if deleted == 0 {
        return Err(AppError::NotFound("Shop not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_request(months: i32) -> CreateProductRequest {
        CreateProductRequest {
            name: "Smart Watch X2".to_string(),
            description: "Fitness tracker".to_string(),
            category: "Wearables".to_string(),
            brand: "Acme".to_string(),
            model: "X2".to_string(),
            warranty_duration_months: months,
            image_url: None,
            specifications: None,
        }
    }

    #[test]
    fn warranty_duration_must_be_within_range() {
        assert!(validate_product(&product_request(12)).is_ok());
        assert!(validate_product(&product_request(0)).is_err());
        assert!(validate_product(&product_request(121)).is_err());
    }
}
