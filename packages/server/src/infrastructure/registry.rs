//! Connection Registry
//!
//! 接続 ID → 接続ごとのセッションデータ（表示名、所属ルーム）の
//! 薄いキー付きストア。初回接触時にランダムな既定表示名で初期化され、
//! 切断時に破棄される。ロジックは持たない。

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, DisplayName, DisplayNameFactory, RoomId};

/// 接続ごとのセッションデータ
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    pub display_name: DisplayName,
    pub current_room: Option<RoomId>,
}

/// Connection Registry 実装
pub struct ConnectionRegistry {
    sessions: Mutex<HashMap<ConnectionId, ConnectionSession>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// 接続を登録し、割り当てた既定表示名を返す
    pub async fn register(&self, conn: ConnectionId) -> DisplayName {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(conn).or_insert_with(|| ConnectionSession {
            display_name: DisplayNameFactory::random(),
            current_room: None,
        });
        session.display_name.clone()
    }

    /// 接続のセッションデータを破棄する
    pub async fn remove(&self, conn: &ConnectionId) -> Option<ConnectionSession> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(conn)
    }

    pub async fn display_name(&self, conn: &ConnectionId) -> Option<DisplayName> {
        let sessions = self.sessions.lock().await;
        sessions.get(conn).map(|s| s.display_name.clone())
    }

    pub async fn current_room(&self, conn: &ConnectionId) -> Option<RoomId> {
        let sessions = self.sessions.lock().await;
        sessions.get(conn).and_then(|s| s.current_room.clone())
    }

    pub async fn set_current_room(&self, conn: &ConnectionId, room: Option<RoomId>) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(conn) {
            session.current_room = room;
        }
    }

    /// 表示名を更新する。登録されていなければ `false`。
    pub async fn set_display_name(&self, conn: &ConnectionId, name: DisplayName) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(conn) {
            Some(session) => {
                session.display_name = name;
                true
            }
            None => false,
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
