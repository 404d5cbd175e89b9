//! ログ出力のみの Persistence Mirror 実装
//!
//! 耐久ストアを構成しないデプロイ向けの実装。受け取った事実を
//! debug レベルで記録するだけで、常に成功を返す。
//! 外部の永続化サービスへの接続はこの trait の別実装として差し込む。

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    ConnectionId, DisplayName, MirrorError, PersistenceMirror, PlaybackState, RoomId,
};

/// ログ出力のみのミラー
pub struct LoggingMirror;

impl LoggingMirror {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceMirror for LoggingMirror {
    async fn create_room(
        &self,
        room_id: &RoomId,
        host: &ConnectionId,
    ) -> Result<(), MirrorError> {
        tracing::debug!("mirror: create_room {} host={}", room_id, host);
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), MirrorError> {
        tracing::debug!("mirror: delete_room {}", room_id);
        Ok(())
    }

    async fn add_member(
        &self,
        room_id: &RoomId,
        conn: &ConnectionId,
        name: &DisplayName,
    ) -> Result<(), MirrorError> {
        tracing::debug!("mirror: add_member {} conn={} name={}", room_id, conn, name);
        Ok(())
    }

    async fn remove_member(&self, conn: &ConnectionId) -> Result<(), MirrorError> {
        tracing::debug!("mirror: remove_member conn={}", conn);
        Ok(())
    }

    async fn update_host(
        &self,
        room_id: &RoomId,
        new_host: &ConnectionId,
    ) -> Result<(), MirrorError> {
        tracing::debug!("mirror: update_host {} new_host={}", room_id, new_host);
        Ok(())
    }

    async fn update_state(
        &self,
        room_id: &RoomId,
        state: &PlaybackState,
    ) -> Result<(), MirrorError> {
        tracing::debug!(
            "mirror: update_state {} video={} pos={} playing={}",
            room_id,
            state.video_id,
            state.position_seconds,
            state.is_playing
        );
        Ok(())
    }

    async fn save_chat_message(
        &self,
        room_id: &RoomId,
        name: &DisplayName,
        text: &str,
    ) -> Result<(), MirrorError> {
        tracing::debug!(
            "mirror: save_chat_message {} from={} len={}",
            room_id,
            name,
            text.len()
        );
        Ok(())
    }

    async fn list_active_rooms(&self) -> Result<Vec<RoomId>, MirrorError> {
        Ok(Vec::new())
    }

    async fn cleanup_older_than(&self, retention: Duration) -> Result<(), MirrorError> {
        tracing::debug!("mirror: cleanup_older_than {:?}", retention);
        Ok(())
    }
}
