//! InMemory Room Store 実装
//!
//! ドメイン層が定義する RoomStore trait の具体的な実装。
//! HashMap をインメモリのルームテーブルとして使用します。
//!
//! ## ロック方針
//!
//! テーブル全体を単一の `tokio::sync::Mutex` で守り、各複合操作は
//! 1 回のロック取得の中で完結します。これにより 1 ルームに対する
//! 全ての変更が線形化され、返されるスナップショットは常にある一貫
//! した瞬間の状態を反映します。ロックを保持したまま await する
//! 外部 I/O はありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, CreatedRoom, DisplayName, JoinedRoom, LeaveOutcome, PlaybackControl,
    PlaybackState, Room, RoomDetail, RoomId, RoomIdFactory, RoomStore, RoomSummary,
    RosterSnapshot, StoreError, Timestamp,
};

/// ID 衝突時のリトライ上限。超過は作成リクエストの失敗であり、
/// プロセス異常ではない。
const MAX_ID_ATTEMPTS: u32 = 16;

/// インメモリ Room Store 実装
pub struct InMemoryRoomStore {
    rooms: Mutex<HashMap<RoomId, Room>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn create_room(
        &self,
        host: ConnectionId,
        host_name: DisplayName,
        now: Timestamp,
    ) -> Result<CreatedRoom, StoreError> {
        let mut rooms = self.rooms.lock().await;

        // 生きているテーブルに対する generate-and-check。
        // 衝突はリトライで吸収し、呼び出し側に見せない。
        let mut room_id = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = RoomIdFactory::generate();
            if !rooms.contains_key(&candidate) {
                room_id = Some(candidate);
                break;
            }
        }
        let room_id = room_id.ok_or(StoreError::RoomIdExhausted(MAX_ID_ATTEMPTS))?;

        let room = Room::new(room_id.clone(), host, host_name, now);
        let roster = room.roster();
        rooms.insert(room_id.clone(), room);

        Ok(CreatedRoom { room_id, roster })
    }

    async fn join_room(
        &self,
        room_id: &RoomId,
        conn: ConnectionId,
        name: DisplayName,
        now: Timestamp,
    ) -> Result<JoinedRoom, StoreError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or(StoreError::RoomNotFound)?;

        room.insert_member(conn, name, now);

        Ok(JoinedRoom {
            room_id: room_id.clone(),
            is_host: room.is_host(&conn),
            roster: room.roster(),
            playback: room.playback.clone(),
        })
    }

    async fn leave_room(&self, room_id: &RoomId, conn: &ConnectionId) -> Option<LeaveOutcome> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id)?;
        let departure = room.remove_member(conn)?;

        let roster = if departure.now_empty {
            // 最後のメンバーの離脱と同時に削除する（空ルームは観測不能）
            rooms.remove(room_id);
            None
        } else {
            Some(room.roster())
        };

        Some(LeaveOutcome::from_departure(departure, roster))
    }

    async fn set_playback(&self, room_id: &RoomId, state: PlaybackState) -> bool {
        let mut rooms = self.rooms.lock().await;
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.playback = Some(state);
                true
            }
            None => false,
        }
    }

    async fn apply_control(
        &self,
        room_id: &RoomId,
        control: PlaybackControl,
        time_seconds: f64,
        now: Timestamp,
    ) -> Result<Option<PlaybackState>, StoreError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or(StoreError::RoomNotFound)?;

        // キャッシュが無ければ状態オブジェクトには no-op
        // （イベント自体の中継は呼び出し側の責務として残る）
        if let Some(state) = room.playback.as_mut() {
            state.apply(control, time_seconds, now);
            Ok(Some(state.clone()))
        } else {
            Ok(None)
        }
    }

    async fn playback(&self, room_id: &RoomId) -> Option<PlaybackState> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).and_then(|room| room.playback.clone())
    }

    async fn host_of(&self, room_id: &RoomId) -> Option<ConnectionId> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(|room| room.host())
    }

    async fn rename_member(
        &self,
        room_id: &RoomId,
        conn: &ConnectionId,
        name: DisplayName,
    ) -> Option<RosterSnapshot> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id)?;
        if room.rename_member(conn, name) {
            Some(room.roster())
        } else {
            None
        }
    }

    async fn roster(&self, room_id: &RoomId) -> Option<RosterSnapshot> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(|room| room.roster())
    }

    async fn member_ids(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|room| room.member_ids())
            .unwrap_or_default()
    }

    async fn sweep_expired(&self, cutoff: Timestamp) -> Vec<RoomId> {
        let mut rooms = self.rooms.lock().await;
        let expired: Vec<RoomId> = rooms
            .iter()
            .filter(|(_, room)| room.created_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            rooms.remove(id);
        }
        expired
    }

    async fn list_rooms(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.lock().await;
        let mut summaries: Vec<RoomSummary> = rooms
            .values()
            .map(|room| RoomSummary {
                room_id: room.id.clone(),
                roster: room.roster(),
                created_at: room.created_at,
            })
            .collect();
        // 一覧応答も決定的な順序で返す
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    async fn room_detail(&self, room_id: &RoomId) -> Option<RoomDetail> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(|room| RoomDetail {
            room_id: room.id.clone(),
            roster: room.roster(),
            playback: room.playback.clone(),
            created_at: room.created_at,
        })
    }
}
