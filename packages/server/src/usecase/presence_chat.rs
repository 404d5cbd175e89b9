//! 表示名とチャットの UseCase
//!
//! 表示名の変更はセッションデータとルームのロースターの両方に反映し、
//! チャットは検証だけしてルーム全員へ中継します（サーバーは履歴を
//! ライブ経路には持たない）。

use std::sync::Arc;

use issho_shared::time::get_utc_timestamp;

use crate::domain::{
    ConnectionId, DisplayName, MessageContent, MessagePusher, PersistenceMirror, RoomStore,
};
use crate::infrastructure::ConnectionRegistry;
use crate::infrastructure::dto::{
    ChatBroadcastMessage, DisplayNameChangedMessage, DisplayNameUpdatedMessage,
    MemberUpdateMessage, MessageType,
};

use super::spawn_mirror_write;

/// 表示名とチャットの UseCase 実装
pub struct PresenceChatUseCase {
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    registry: Arc<ConnectionRegistry>,
    mirror: Arc<dyn PersistenceMirror>,
}

impl PresenceChatUseCase {
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

    /// 表示名を変更する。送信者には可否の応答、ルームには新しい
    /// ロースターと改名通知が流れる。
    pub async fn rename(&self, conn: ConnectionId, raw_name: String) {
        let Ok(new_name) = DisplayName::new(raw_name) else {
            let reply = DisplayNameUpdatedMessage {
                r#type: MessageType::DisplayNameUpdated,
                ok: false,
                display_name: String::new(),
            };
            self.push(&conn, &serde_json::to_string(&reply).unwrap())
                .await;
            return;
        };

        let old_name = match self.registry.display_name(&conn).await {
            Some(name) => name,
            None => self.registry.register(conn).await,
        };
        self.registry.set_display_name(&conn, new_name.clone()).await;

        let reply = DisplayNameUpdatedMessage {
            r#type: MessageType::DisplayNameUpdated,
            ok: true,
            display_name: new_name.as_str().to_string(),
        };
        self.push(&conn, &serde_json::to_string(&reply).unwrap())
            .await;

        // ルーム所属中なら、ロースターを全員に、改名通知を本人以外に
        if let Some(room_id) = self.registry.current_room(&conn).await
            && let Some(roster) = self
                .store
                .rename_member(&room_id, &conn, new_name.clone())
                .await
        {
            let update = MemberUpdateMessage::from(&roster);
            let all: Vec<ConnectionId> = roster.members.iter().map(|m| m.id).collect();
            self.send_all(all.clone(), &serde_json::to_string(&update).unwrap())
                .await;

            let changed = DisplayNameChangedMessage {
                r#type: MessageType::DisplayNameChanged,
                old_name: old_name.as_str().to_string(),
                new_name: new_name.as_str().to_string(),
            };
            let others = all.into_iter().filter(|id| id != &conn).collect();
            self.send_all(others, &serde_json::to_string(&changed).unwrap())
                .await;

            tracing::debug!(
                "room {}: {} renamed {} -> {}",
                room_id,
                conn,
                old_name,
                new_name
            );
        }
    }

    /// チャットメッセージをルーム全員に中継する。
    /// 送信者自身にも配信し、全員が同じ順序を観測する。
    pub async fn post_chat(&self, conn: ConnectionId, text: String) {
        // 空白のみ・長すぎるメッセージは応答なしで破棄
        let Ok(content) = MessageContent::new(text) else {
            return;
        };
        let Some(room_id) = self.registry.current_room(&conn).await else {
            return;
        };
        let Some(display_name) = self.registry.display_name(&conn).await else {
            return;
        };

        let targets = self.store.member_ids(&room_id).await;
        if targets.is_empty() {
            return;
        }

        let broadcast = ChatBroadcastMessage {
            r#type: MessageType::ChatMessage,
            display_name: display_name.as_str().to_string(),
            text: content.as_str().to_string(),
            timestamp: get_utc_timestamp(),
        };
        self.send_all(targets, &serde_json::to_string(&broadcast).unwrap())
            .await;

        let mirror = Arc::clone(&self.mirror);
        spawn_mirror_write("save_chat_message", async move {
            mirror
                .save_chat_message(&room_id, &display_name, content.as_str())
                .await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockPersistenceMirror, RoomId, RoomStore, Timestamp};
    use crate::infrastructure::{InMemoryRoomStore, LoggingMirror};
    use crate::usecase::test_support::RecordingPusher;

    struct Fixture {
        usecase: PresenceChatUseCase,
        store: Arc<InMemoryRoomStore>,
        pusher: Arc<RecordingPusher>,
        registry: Arc<ConnectionRegistry>,
    }

    async fn two_member_room(
        mirror: Arc<dyn PersistenceMirror>,
    ) -> (Fixture, RoomId, ConnectionId, ConnectionId) {
        let store = Arc::new(InMemoryRoomStore::new());
        let pusher = Arc::new(RecordingPusher::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase =
            PresenceChatUseCase::new(store.clone(), pusher.clone(), registry.clone(), mirror);

        let host = ConnectionId::generate();
        let guest = ConnectionId::generate();
        let host_name = DisplayName::new("host".to_string()).unwrap();
        let guest_name = DisplayName::new("guest".to_string()).unwrap();

        let created = store
            .create_room(host, host_name.clone(), Timestamp::new(1000))
            .await
            .unwrap();
        let room_id = created.room_id;
        store
            .join_room(&room_id, guest, guest_name.clone(), Timestamp::new(2000))
            .await
            .unwrap();

        registry.register(host).await;
        registry.set_display_name(&host, host_name).await;
        registry.set_current_room(&host, Some(room_id.clone())).await;
        registry.register(guest).await;
        registry.set_display_name(&guest, guest_name).await;
        registry
            .set_current_room(&guest, Some(room_id.clone()))
            .await;

        (
            Fixture {
                usecase,
                store,
                pusher,
                registry,
            },
            room_id,
            host,
            guest,
        )
    }

    #[tokio::test]
    async fn test_rename_updates_roster_and_notifies() {
        // テスト項目: 改名でロースターが更新され、他メンバーに通知される
        // given (前提条件):
        let (fx, room_id, host, guest) = two_member_room(Arc::new(LoggingMirror::new())).await;

        // when (操作):
        fx.usecase.rename(guest, "alice".to_string()).await;

        // then (期待する結果): 本人への応答
        let to_guest = fx.pusher.sent_to(&guest).await;
        assert!(to_guest.iter().any(|m| {
            m.contains(r#""type":"display_name_updated""#)
                && m.contains(r#""ok":true"#)
                && m.contains("alice")
        }));

        // 他メンバーへのロースターと改名通知
        let to_host = fx.pusher.sent_to(&host).await;
        assert!(to_host
            .iter()
            .any(|m| m.contains(r#""type":"member_update""#) && m.contains("alice")));
        assert!(to_host.iter().any(|m| {
            m.contains(r#""type":"display_name_changed""#)
                && m.contains(r#""old_name":"guest""#)
                && m.contains(r#""new_name":"alice""#)
        }));

        let roster = fx.store.roster(&room_id).await.unwrap();
        assert!(roster
            .members
            .iter()
            .any(|m| m.id == guest && m.display_name.as_str() == "alice"));
    }

    #[tokio::test]
    async fn test_rename_rejects_invalid_name() {
        // テスト項目: 空白のみの表示名は拒否応答になり、状態は変わらない
        // given (前提条件):
        let (fx, room_id, _host, guest) = two_member_room(Arc::new(LoggingMirror::new())).await;

        // when (操作):
        fx.usecase.rename(guest, "   ".to_string()).await;

        // then (期待する結果):
        let to_guest = fx.pusher.sent_to(&guest).await;
        assert!(to_guest
            .iter()
            .any(|m| m.contains(r#""type":"display_name_updated""#)
                && m.contains(r#""ok":false"#)));
        assert_eq!(
            fx.registry.display_name(&guest).await.unwrap().as_str(),
            "guest"
        );
        let roster = fx.store.roster(&room_id).await.unwrap();
        assert!(roster
            .members
            .iter()
            .any(|m| m.id == guest && m.display_name.as_str() == "guest"));
    }

    #[tokio::test]
    async fn test_rename_outside_room_only_updates_session() {
        // テスト項目: ルーム外の改名はセッションデータだけ更新する
        // given (前提条件):
        let (fx, _room_id, _host, _guest) = two_member_room(Arc::new(LoggingMirror::new())).await;
        let stranger = ConnectionId::generate();
        fx.registry.register(stranger).await;

        // when (操作):
        fx.usecase.rename(stranger, "bob".to_string()).await;

        // then (期待する結果): 応答は本人のみで、ルームには何も流れない
        assert_eq!(
            fx.registry.display_name(&stranger).await.unwrap().as_str(),
            "bob"
        );
        let all = fx.pusher.all().await;
        assert!(all.iter().all(|(conn, _)| conn == &stranger));
    }

    #[tokio::test]
    async fn test_chat_reaches_everyone_including_sender() {
        // テスト項目: チャットが送信者を含む全員に同一内容で届く
        // given (前提条件):
        let (fx, _room_id, host, guest) = two_member_room(Arc::new(LoggingMirror::new())).await;

        // when (操作):
        fx.usecase.post_chat(guest, "  hello world  ".to_string()).await;

        // then (期待する結果): 前後の空白は落ちる
        for conn in [host, guest] {
            let sent = fx.pusher.sent_to(&conn).await;
            assert!(sent.iter().any(|m| {
                m.contains(r#""type":"chat_message""#)
                    && m.contains(r#""text":"hello world""#)
                    && m.contains(r#""display_name":"guest""#)
            }));
        }
    }

    #[tokio::test]
    async fn test_whitespace_only_chat_is_dropped() {
        // テスト項目: 空白のみのチャットは応答なしで破棄される
        // given (前提条件):
        let (fx, _room_id, _host, guest) = two_member_room(Arc::new(LoggingMirror::new())).await;

        // when (操作):
        fx.usecase.post_chat(guest, " \n\t ".to_string()).await;

        // then (期待する結果):
        assert!(fx.pusher.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_chat_is_mirrored_to_persistence() {
        // テスト項目: チャットが永続ミラーに write-through される
        // given (前提条件):
        let mut mock = MockPersistenceMirror::new();
        mock.expect_save_chat_message()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let (fx, _room_id, _host, guest) = two_member_room(Arc::new(mock)).await;

        // when (操作):
        fx.usecase.post_chat(guest, "hi".to_string()).await;

        // then (期待する結果): fire-and-forget タスクの完了を待って検証
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
