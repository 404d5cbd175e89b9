//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    infrastructure::dto::{PlaybackStateDto, RoomDetailDto, RoomMemberDto, RoomSummaryDto},
    ui::state::AppState,
};
use issho_shared::time::timestamp_to_rfc3339;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of live rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.room_query.list_rooms().await;

    // Domain Model から DTO への変換
    let summaries: Vec<RoomSummaryDto> = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            room_id: room.room_id.as_str().to_string(),
            member_count: room.roster.member_count,
            members: room.roster.members.iter().map(RoomMemberDto::from).collect(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        })
        .collect();

    Json(summaries)
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room = state
        .room_query
        .room_detail(&room_id)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    let detail = RoomDetailDto {
        room_id: room.room_id.as_str().to_string(),
        member_count: room.roster.member_count,
        members: room.roster.members.iter().map(RoomMemberDto::from).collect(),
        playback_state: room.playback.map(PlaybackStateDto::from),
        created_at: timestamp_to_rfc3339(room.created_at.value()),
    };
    Ok(Json(detail))
}

/// Query parameters for video search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    10
}

/// Search videos via the configured upstream API.
/// API キー未設定のデプロイでは 503 を返す。
pub async fn search_videos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let Some(youtube) = state.youtube.as_ref() else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    if query.q.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match youtube.search(query.q.trim(), query.max_results).await {
        Ok(body) => Ok(Json(body)),
        Err(e) => {
            tracing::warn!("video search failed: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}
