//! ルームライフサイクルの UseCase
//!
//! 作成・参加・離脱・切断・期限掃除を扱います。
//! 「1 接続は高々 1 ルームのメンバー」の不変条件はここで維持されます:
//! 作成・参加の前に必ず既存の所属を解消してから進みます。

use std::sync::Arc;
use std::time::Duration;

use issho_shared::time::get_utc_timestamp;

use crate::domain::{
    ConnectionId, DisplayName, LeaveOutcome, MessagePusher, PersistenceMirror, PusherChannel,
    RoomId, RoomStore, RosterSnapshot, StoreError, Timestamp,
};
use crate::infrastructure::ConnectionRegistry;
use crate::infrastructure::dto::{
    HostChangedMessage, JoinErrorMessage, MemberUpdateMessage, MessageType, PlaybackStateDto,
    RoomCreatedMessage, RoomJoinedMessage, RoomMemberDto, UserJoinedMessage, UserLeftMessage,
    YouAreHostMessage,
};

use super::error::{CreateRoomError, JoinRoomError};
use super::spawn_mirror_write;

/// ルームライフサイクルの UseCase 実装
pub struct RoomSessionUseCase {
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    registry: Arc<ConnectionRegistry>,
    mirror: Arc<dyn PersistenceMirror>,
}

impl RoomSessionUseCase {
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

    /// 接続の受け入れ: 送信チャンネルの登録と既定表示名の割り当て
    pub async fn connect(&self, conn: ConnectionId, sender: PusherChannel) -> DisplayName {
        self.pusher.register_connection(conn, sender).await;
        let display_name = self.registry.register(conn).await;
        tracing::info!("connection {} registered as {}", conn, display_name);
        display_name
    }

    /// 切断: 所属ルームからの離脱とセッションデータの破棄
    pub async fn disconnect(&self, conn: ConnectionId) {
        self.leave_room(conn).await;
        self.registry.remove(&conn).await;
        self.pusher.unregister_connection(&conn).await;
        tracing::info!("connection {} disconnected", conn);
    }

    /// ルームを新規作成する。
    /// 既に別ルームに所属していれば、先にそちらを離脱してから作成する。
    pub async fn create_room(&self, conn: ConnectionId) -> Result<RoomId, CreateRoomError> {
        self.leave_room(conn).await;

        let display_name = match self.registry.display_name(&conn).await {
            Some(name) => name,
            None => self.registry.register(conn).await,
        };

        let now = Timestamp::new(get_utc_timestamp());
        let created = match self.store.create_room(conn, display_name.clone(), now).await {
            Ok(created) => created,
            Err(StoreError::RoomIdExhausted(attempts)) => {
                tracing::error!(
                    "room creation failed: id space exhausted after {} attempts",
                    attempts
                );
                return Err(CreateRoomError::IdExhausted(attempts));
            }
            Err(e) => {
                tracing::error!("room creation failed: {}", e);
                return Err(CreateRoomError::Store(e));
            }
        };

        self.registry
            .set_current_room(&conn, Some(created.room_id.clone()))
            .await;

        let reply = RoomCreatedMessage {
            r#type: MessageType::RoomCreated,
            ok: true,
            room_id: created.room_id.as_str().to_string(),
            display_name: display_name.as_str().to_string(),
            is_host: true,
        };
        self.push(&conn, &serde_json::to_string(&reply).unwrap())
            .await;
        self.broadcast_roster(&created.roster).await;

        tracing::info!("room {} created by {}", created.room_id, conn);

        let mirror = Arc::clone(&self.mirror);
        let room_id = created.room_id.clone();
        spawn_mirror_write("create_room", async move {
            mirror.create_room(&room_id, &conn).await?;
            mirror.add_member(&room_id, &conn, &display_name).await
        });

        Ok(created.room_id)
    }

    /// ルームに参加する。
    /// ID が不正・未知の場合は外部から区別できない `join_error` を返す。
    pub async fn join_room(
        &self,
        conn: ConnectionId,
        room_id_raw: &str,
        requested_name: Option<String>,
    ) -> Result<RoomId, JoinRoomError> {
        let Ok(room_id) = RoomId::new(room_id_raw.trim().to_string()) else {
            self.push_join_error(&conn).await;
            return Err(JoinRoomError::NotFound);
        };

        // 失敗する参加は一切の状態を変えない: ルームの実在を確認してから
        // 旧ルームの所属解消に進む
        if self.store.roster(&room_id).await.is_none() {
            self.push_join_error(&conn).await;
            return Err(JoinRoomError::NotFound);
        }

        // 同一ルームへの再参加では所属の解消を行わない
        if self.registry.current_room(&conn).await.as_ref() != Some(&room_id) {
            self.leave_room(conn).await;
        }

        // 希望表示名が有効ならそれを採用、無効・未指定なら既存名を維持。
        // セッションデータへの反映は参加の成立後に行う
        let requested = requested_name.and_then(|raw| DisplayName::new(raw).ok());
        let display_name = match requested.clone() {
            Some(name) => name,
            None => match self.registry.display_name(&conn).await {
                Some(name) => name,
                None => self.registry.register(conn).await,
            },
        };

        let now = Timestamp::new(get_utc_timestamp());
        let joined = match self
            .store
            .join_room(&room_id, conn, display_name.clone(), now)
            .await
        {
            Ok(joined) => joined,
            Err(_) => {
                // 実在確認との間に掃除が走ったレース
                self.push_join_error(&conn).await;
                return Err(JoinRoomError::NotFound);
            }
        };

        if let Some(name) = requested {
            self.registry.register(conn).await;
            self.registry.set_display_name(&conn, name).await;
        }
        self.registry
            .set_current_room(&conn, Some(room_id.clone()))
            .await;

        // 参加応答には再生状態まで含める（後続メッセージとのレースを排除）
        let reply = RoomJoinedMessage {
            r#type: MessageType::RoomJoined,
            ok: true,
            room_id: room_id.as_str().to_string(),
            display_name: display_name.as_str().to_string(),
            is_host: joined.is_host,
            member_count: joined.roster.member_count,
            members: joined.roster.members.iter().map(RoomMemberDto::from).collect(),
            playback_state: joined.playback.map(PlaybackStateDto::from),
        };
        self.push(&conn, &serde_json::to_string(&reply).unwrap())
            .await;

        self.broadcast_roster(&joined.roster).await;

        let joined_notice = UserJoinedMessage {
            r#type: MessageType::UserJoined,
            display_name: display_name.as_str().to_string(),
        };
        let others = joined
            .roster
            .members
            .iter()
            .map(|m| m.id)
            .filter(|id| id != &conn)
            .collect();
        self.send_all(others, &serde_json::to_string(&joined_notice).unwrap())
            .await;

        tracing::info!("{} joined room {}", conn, room_id);

        let mirror = Arc::clone(&self.mirror);
        let mirror_room = room_id.clone();
        spawn_mirror_write("add_member", async move {
            mirror.add_member(&mirror_room, &conn, &display_name).await
        });

        Ok(room_id)
    }

    /// 所属ルームから離脱する。所属が無ければ何もしない。
    /// 最後のメンバーならルームは即座に消滅し、ホストの離脱なら
    /// 残存メンバーの中から新ホストへ移譲する。
    pub async fn leave_room(&self, conn: ConnectionId) {
        let Some(room_id) = self.registry.current_room(&conn).await else {
            return;
        };
        self.registry.set_current_room(&conn, None).await;

        let Some(outcome) = self.store.leave_room(&room_id, &conn).await else {
            // 掃除・削除とのレース。良性なので記録だけ残す
            tracing::debug!("stale leave for {} in room {}", conn, room_id);
            return;
        };

        match outcome {
            LeaveOutcome::RoomDeleted { departed_name } => {
                tracing::info!(
                    "room {} deleted (last member {} left)",
                    room_id,
                    departed_name
                );
                let mirror = Arc::clone(&self.mirror);
                spawn_mirror_write("delete_room", async move {
                    mirror.remove_member(&conn).await?;
                    mirror.delete_room(&room_id).await
                });
            }
            LeaveOutcome::MemberLeft {
                departed_name,
                new_host,
                roster,
            } => {
                let remaining: Vec<ConnectionId> = roster.members.iter().map(|m| m.id).collect();

                self.broadcast_roster(&roster).await;

                let left_notice = UserLeftMessage {
                    r#type: MessageType::UserLeft,
                    display_name: departed_name.as_str().to_string(),
                };
                self.send_all(
                    remaining.clone(),
                    &serde_json::to_string(&left_notice).unwrap(),
                )
                .await;

                if let Some(successor) = new_host {
                    let promotion = YouAreHostMessage::new();
                    self.push(&successor, &serde_json::to_string(&promotion).unwrap())
                        .await;

                    let successor_name = roster
                        .members
                        .iter()
                        .find(|m| m.id == successor)
                        .map(|m| m.display_name.as_str().to_string())
                        .unwrap_or_default();
                    let changed = HostChangedMessage {
                        r#type: MessageType::HostChanged,
                        new_host_id: successor.to_string(),
                        new_host_name: successor_name,
                    };
                    self.send_all(remaining, &serde_json::to_string(&changed).unwrap())
                        .await;

                    tracing::info!("host of room {} changed to {}", room_id, successor);

                    let mirror = Arc::clone(&self.mirror);
                    let mirror_room = room_id.clone();
                    spawn_mirror_write("update_host", async move {
                        mirror.update_host(&mirror_room, &successor).await
                    });
                }

                tracing::info!("{} left room {}", conn, room_id);

                let mirror = Arc::clone(&self.mirror);
                spawn_mirror_write("remove_member", async move {
                    mirror.remove_member(&conn).await
                });
            }
        }
    }

    /// `created_at` が保持期間を超えたルームを削除する。
    /// メンバーの有無は見ないリークガード（通常は空になった時点で消える）。
    pub async fn sweep_expired(&self, retention: Duration) -> usize {
        let cutoff = Timestamp::new(get_utc_timestamp() - retention.as_millis() as i64);
        let removed = self.store.sweep_expired(cutoff).await;

        if !removed.is_empty() {
            tracing::info!("swept {} expired room(s)", removed.len());
        }

        let count = removed.len();
        let mirror = Arc::clone(&self.mirror);
        spawn_mirror_write("sweep", async move {
            for room_id in &removed {
                mirror.delete_room(room_id).await?;
            }
            mirror.cleanup_older_than(retention).await
        });

        count
    }

    /// 正準ロースター射影をルーム全員に送る
    async fn broadcast_roster(&self, roster: &RosterSnapshot) {
        let update = MemberUpdateMessage::from(roster);
        let targets = roster.members.iter().map(|m| m.id).collect();
        self.send_all(targets, &serde_json::to_string(&update).unwrap())
            .await;
    }

    async fn push_join_error(&self, conn: &ConnectionId) {
        let reply = JoinErrorMessage::not_found();
        self.push(conn, &serde_json::to_string(&reply).unwrap())
            .await;
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
