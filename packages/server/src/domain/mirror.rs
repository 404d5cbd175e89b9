//! Persistence Mirror trait 定義
//!
//! 耐久ストアへのベストエフォートな write-through。クラッシュリカバリと
//! 分析のための鏡であり、ライブプロトコルの正しさには寄与しない。
//!
//! 全ての呼び出しはプロトコル側から見て fire-and-forget:
//! インメモリの操作が完了して応答を返した後に非同期で発行され、
//! 失敗はログに残るだけで決して伝播しない。

use std::time::Duration;

use async_trait::async_trait;

use super::entity::PlaybackState;
use super::error::MirrorError;
use super::value_object::{ConnectionId, DisplayName, RoomId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceMirror: Send + Sync {
    async fn create_room(&self, room_id: &RoomId, host: &ConnectionId)
    -> Result<(), MirrorError>;

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), MirrorError>;

    async fn add_member(
        &self,
        room_id: &RoomId,
        conn: &ConnectionId,
        name: &DisplayName,
    ) -> Result<(), MirrorError>;

    async fn remove_member(&self, conn: &ConnectionId) -> Result<(), MirrorError>;

    async fn update_host(
        &self,
        room_id: &RoomId,
        new_host: &ConnectionId,
    ) -> Result<(), MirrorError>;

    async fn update_state(
        &self,
        room_id: &RoomId,
        state: &PlaybackState,
    ) -> Result<(), MirrorError>;

    async fn save_chat_message(
        &self,
        room_id: &RoomId,
        name: &DisplayName,
        text: &str,
    ) -> Result<(), MirrorError>;

    async fn list_active_rooms(&self) -> Result<Vec<RoomId>, MirrorError>;

    async fn cleanup_older_than(&self, retention: Duration) -> Result<(), MirrorError>;
}
