mod admin;
mod analytics;
mod batches;
mod claims;
mod health;
mod login;
mod products;
mod public;
mod register;
mod units;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};

use crate::{AppState, middleware};

pub fn create_router() -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/register", post(register::register_user))
        .route("/auth/login", post(login::login_user))
        .route("/products", get(products::search_products))
        .route("/products/{id}", get(products::get_product))
        .route("/product/{token}", get(public::get_unit_by_token))
        .route("/product/{token}/activate", post(public::activate_unit))
        .route("/product/{token}/claims", post(claims::create_claim));

    let staff_routes = Router::new()
        .route(
            "/batches",
            get(batches::search_batches).post(batches::create_batch),
        )
        .route("/batches/{id}", get(batches::get_batch))
        .route("/batches/{id}/units", post(batches::generate_units))
        .route("/batches/{id}/status", put(batches::transition_batch))
        .route("/batches/{id}/stickers", get(batches::sticker_preview))
        .route("/batches/{id}/pdf", get(batches::download_pdf))
        .route("/units", get(units::search_units))
        .route("/claims", get(claims::search_claims))
        .route("/claims/{id}", get(claims::get_claim))
        .route("/claims/{id}/status", put(claims::update_claim_status))
        .route("/analytics", get(analytics::get_analytics))
        .layer(from_fn(middleware::auth_middleware));

    let admin_routes = Router::new()
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/shops", get(admin::list_shops).post(admin::create_shop))
        .route(
            "/shops/{id}",
            get(admin::get_shop)
                .put(admin::update_shop)
                .delete(admin::delete_shop),
        )
        .layer(from_fn(middleware::admin_middleware));

    public_routes
        .merge(staff_routes)
        .nest("/admin", admin_routes)
}
