use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::ApiState;
use pitstop_db::{CompletedTaskSummary, Mechanic, MechanicStats, TopMechanic};

/// How many completed tasks a mechanic detail view carries.
const RECENT_TASK_LIMIT: i64 = 10;

const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

#[derive(Debug, Serialize)]
pub struct RankedMechanic {
    #[serde(flatten)]
    pub mechanic: Mechanic,
    pub rank: i64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub mechanic: Mechanic,
    pub rank: i64,
    pub medal: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct MechanicDetail {
    #[serde(flatten)]
    pub mechanic: Mechanic,
    pub recent_tasks: Vec<CompletedTaskSummary>,
}

#[derive(Debug, Serialize)]
pub struct MechanicStatsResponse {
    #[serde(flatten)]
    pub stats: MechanicStats,
    pub top_mechanic: Option<TopMechanic>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

/// Full roster with ranking positions.
pub async fn list_mechanics(
    State(state): State<ApiState>,
) -> Result<Json<Vec<RankedMechanic>>, ApiError> {
    let ranked = state
        .db
        .list_mechanics()
        .await?
        .into_iter()
        .enumerate()
        .map(|(index, mechanic)| RankedMechanic {
            mechanic,
            rank: index as i64 + 1,
        })
        .collect();

    Ok(Json(ranked))
}

/// Scoring mechanics only, medals on the podium.
pub async fn leaderboard(
    State(state): State<ApiState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let entries = state
        .db
        .leaderboard(limit)
        .await?
        .into_iter()
        .enumerate()
        .map(|(index, mechanic)| {
            let rank = index as i64 + 1;
            LeaderboardEntry {
                mechanic,
                rank,
                medal: medal_for(rank),
            }
        })
        .collect();

    Ok(Json(entries))
}

pub async fn mechanic_stats(
    State(state): State<ApiState>,
) -> Result<Json<MechanicStatsResponse>, ApiError> {
    let (stats, top_mechanic) = state.db.mechanic_stats().await?;
    Ok(Json(MechanicStatsResponse {
        stats,
        top_mechanic,
    }))
}

pub async fn get_mechanic(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<MechanicDetail>, ApiError> {
    let Some(mechanic) = state.db.get_mechanic(&name).await? else {
        return Err(ApiError::NotFound("Mechanic"));
    };
    let recent_tasks = state
        .db
        .mechanic_recent_tasks(&name, RECENT_TASK_LIMIT)
        .await?;

    Ok(Json(MechanicDetail {
        mechanic,
        recent_tasks,
    }))
}

fn medal_for(rank: i64) -> Option<&'static str> {
    match rank {
        1 => Some("\u{1F947}"),
        2 => Some("\u{1F948}"),
        3 => Some("\u{1F949}"),
        _ => None,
    }
}
