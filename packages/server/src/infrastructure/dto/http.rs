//! HTTP API response DTOs.

use serde::Serialize;

use super::websocket::{PlaybackStateDto, RoomMemberDto};

/// ルーム一覧の 1 行
#[derive(Debug, Serialize)]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub member_count: usize,
    pub members: Vec<RoomMemberDto>,
    pub created_at: String,
}

/// ルーム詳細
#[derive(Debug, Serialize)]
pub struct RoomDetailDto {
    pub room_id: String,
    pub member_count: usize,
    pub members: Vec<RoomMemberDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_state: Option<PlaybackStateDto>,
    pub created_at: String,
}
