use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    error::Result,
    models::{UnitQuery, UnitSearchResponse},
    queries::unit_queries,
};

pub async fn search_units(
    State(state): State<AppState>,
    Query(params): Query<UnitQuery>,
) -> Result<Json<UnitSearchResponse>> {
    let units = unit_queries::search_units(&state.db, params).await?;

    Ok(Json(units))
}
