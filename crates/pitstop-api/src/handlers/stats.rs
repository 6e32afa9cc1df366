use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::state::ApiState;
use pitstop_db::AggregateStats;

pub async fn get_statistics(State(state): State<ApiState>) -> Result<Json<AggregateStats>, ApiError> {
    let stats = state.db.aggregate_stats().await?;
    Ok(Json(stats))
}
