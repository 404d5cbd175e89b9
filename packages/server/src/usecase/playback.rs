//! 再生状態同期の UseCase
//!
//! ホスト権威モデル: サーバーは再生コマンドを検証せずに中継し、
//! 最後に観測した状態をルームごとにキャッシュします。キャッシュは
//! 参加応答と request_sync の応答に使われます。

use std::sync::Arc;

use issho_shared::time::get_utc_timestamp;

use crate::domain::{
    ConnectionId, MessagePusher, PersistenceMirror, PlaybackControl, PlaybackState, RoomStore,
    Timestamp,
};
use crate::infrastructure::ConnectionRegistry;
use crate::infrastructure::dto::{
    ChangeVideoMessage, MessageType, PlaybackControlMessage, PlaybackStateDto,
    RequestSyncFromHostMessage, SyncStateMessage,
};

use super::spawn_mirror_write;

/// 再生状態同期の UseCase 実装
pub struct PlaybackUseCase {
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    registry: Arc<ConnectionRegistry>,
    mirror: Arc<dyn PersistenceMirror>,
}

impl PlaybackUseCase {
    pub fn new(
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn MessagePusher>,
        registry: Arc<ConnectionRegistry>,
        mirror: Arc<dyn PersistenceMirror>,
    ) -> Self {
        Self {
            store,
            pusher,
            registry,
            mirror,
        }
    }

    /// 動画の切り替え。キャッシュを一時停止状態で置き換え、
    /// 送信者を含む全員に通知する（切り替えは全員が再ロードするため）。
    pub async fn change_video(&self, conn: ConnectionId, video_id: String, start_time_seconds: f64) {
        let Some(room_id) = self.registry.current_room(&conn).await else {
            return;
        };
        let trimmed = video_id.trim();
        if trimmed.is_empty() {
            return;
        }
        let Some(by) = self.registry.display_name(&conn).await else {
            return;
        };

        let state = PlaybackState {
            video_id: trimmed.to_string(),
            position_seconds: start_time_seconds,
            is_playing: false,
            last_updated: Timestamp::new(get_utc_timestamp()),
        };
        if !self.store.set_playback(&room_id, state.clone()).await {
            return;
        }

        let notice = ChangeVideoMessage {
            r#type: MessageType::ChangeVideo,
            video_id: trimmed.to_string(),
            start_time_seconds,
            by: by.as_str().to_string(),
        };
        let targets = self.store.member_ids(&room_id).await;
        self.send_all(targets, &serde_json::to_string(&notice).unwrap())
            .await;

        tracing::debug!("room {}: video changed to {} by {}", room_id, trimmed, conn);

        let mirror = Arc::clone(&self.mirror);
        spawn_mirror_write("update_state", async move {
            mirror.update_state(&room_id, &state).await
        });
    }

    /// play / pause / seek の中継。キャッシュに適用し、送信者以外へ流す
    /// （送信者は自分の操作を既に反映済み）。
    pub async fn control(&self, conn: ConnectionId, control: PlaybackControl, time_seconds: f64) {
        let Some(room_id) = self.registry.current_room(&conn).await else {
            return;
        };
        let Some(by) = self.registry.display_name(&conn).await else {
            return;
        };

        let now = Timestamp::new(get_utc_timestamp());
        let updated = match self
            .store
            .apply_control(&room_id, control, time_seconds, now)
            .await
        {
            Ok(updated) => updated,
            // 掃除とのレース。中継せず捨てる
            Err(_) => return,
        };

        let message_type = match control {
            PlaybackControl::Play => MessageType::Play,
            PlaybackControl::Pause => MessageType::Pause,
            PlaybackControl::Seek => MessageType::Seek,
        };
        let notice = PlaybackControlMessage {
            r#type: message_type,
            time_seconds,
            by: by.as_str().to_string(),
        };
        let targets: Vec<ConnectionId> = self
            .store
            .member_ids(&room_id)
            .await
            .into_iter()
            .filter(|id| id != &conn)
            .collect();
        self.send_all(targets, &serde_json::to_string(&notice).unwrap())
            .await;

        if let Some(state) = updated {
            let mirror = Arc::clone(&self.mirror);
            spawn_mirror_write("update_state", async move {
                mirror.update_state(&room_id, &state).await
            });
        }
    }

    /// 同期要求。キャッシュがあれば即応答し、無ければホストへ転送する。
    pub async fn request_sync(&self, conn: ConnectionId) {
        let Some(room_id) = self.registry.current_room(&conn).await else {
            return;
        };

        if let Some(state) = self.store.playback(&room_id).await {
            let reply = SyncStateMessage {
                r#type: MessageType::SyncState,
                state: PlaybackStateDto::from(state),
            };
            self.push(&conn, &serde_json::to_string(&reply).unwrap())
                .await;
        } else if let Some(host) = self.store.host_of(&room_id).await {
            let forward = RequestSyncFromHostMessage {
                r#type: MessageType::RequestSyncFromHost,
                target_connection: conn.to_string(),
            };
            self.push(&host, &serde_json::to_string(&forward).unwrap())
                .await;
        }
    }

    /// ホストからの状態レポート。キャッシュを更新し、要求元へ転送する。
    pub async fn report_sync_state(
        &self,
        conn: ConnectionId,
        target_raw: &str,
        state: PlaybackStateDto,
    ) {
        let Some(room_id) = self.registry.current_room(&conn).await else {
            return;
        };
        let Ok(target) = ConnectionId::parse(target_raw) else {
            tracing::debug!("sync_state with malformed target from {}", conn);
            return;
        };

        // 送信者のホスト検証は行わない。運用で観測できるよう警告だけ残す
        if self.store.host_of(&room_id).await != Some(conn) {
            tracing::warn!("sync_state from non-host {} in room {}", conn, room_id);
        }

        let now = Timestamp::new(get_utc_timestamp());
        let domain_state = state.clone().into_domain(now);
        if !self.store.set_playback(&room_id, domain_state.clone()).await {
            return;
        }

        let forward = SyncStateMessage {
            r#type: MessageType::SyncState,
            state,
        };
        self.push(&target, &serde_json::to_string(&forward).unwrap())
            .await;

        let mirror = Arc::clone(&self.mirror);
        spawn_mirror_write("update_state", async move {
            mirror.update_state(&room_id, &domain_state).await
        });
    }

    async fn push(&self, conn: &ConnectionId, content: &str) {
        if let Err(e) = self.pusher.push_to(conn, content).await {
            tracing::warn!("push to {} failed: {}", conn, e);
        }
    }

    async fn send_all(&self, targets: Vec<ConnectionId>, content: &str) {
        if let Err(e) = self.pusher.broadcast(targets, content).await {
            tracing::warn!("broadcast failed: {}", e);
        }
    }
}
