use axum::{Json, extract::State};

use crate::{AppState, error::Result, models::Analytics, queries::analytics_queries};

pub async fn get_analytics(State(state): State<AppState>) -> Result<Json<Analytics>> {
    let analytics = analytics_queries::gather(&state.db).await?;

    Ok(Json(analytics))
}
