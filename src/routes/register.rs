use axum::{extract::State, Json};

use crate::{
    error::{AppError, Result},
    models::{AuthResponse, RegisterRequest, UserRole},
    queries::user_queries,
    utils::jwt,
    AppState,
};

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    validate_registration(&payload)?;

    if user_queries::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let role = payload.role.unwrap_or(UserRole::InventoryUser);

    if matches!(role, UserRole::ShopOwner | UserRole::InventoryUser) && payload.shop_id.is_none() {
        return Err(AppError::BadRequest(
            "shop_id is required for shop roles".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user = user_queries::create_user(
        &state.db,
        &payload.email,
        &payload.name,
        &password_hash,
        role,
        payload.shop_id,
    )
    .await?;

    let token = jwt::generate_token(user.id, &user.email, &user.name, user.role)?;

    Ok(Json(AuthResponse { token }))
}

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".to_string()));
    }

    if payload.password.len() < 6 {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, name: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            role: None,
            shop_id: Some(1),
        }
    }

    #[test]
    fn accepts_well_formed_registration() {
        assert!(validate_registration(&request("a@b.com", "Nino", "secret1")).is_ok());
    }

    #[test]
    fn rejects_bad_email_name_or_password() {
        assert!(validate_registration(&request("not-an-email", "Nino", "secret1")).is_err());
        assert!(validate_registration(&request("a@b.com", "  ", "secret1")).is_err());
        assert!(validate_registration(&request("a@b.com", "Nino", "short")).is_err());
    }
}
