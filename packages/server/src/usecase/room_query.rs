//! REST 照会の UseCase
//!
//! 生きているルームの読み取り専用射影。ライブプロトコルには影響しない。

use std::sync::Arc;

use crate::domain::{RoomDetail, RoomId, RoomStore, RoomSummary};

use super::error::RoomQueryError;

/// REST 照会の UseCase 実装
pub struct RoomQueryUseCase {
    store: Arc<dyn RoomStore>,
}

impl RoomQueryUseCase {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// 生きている全ルームの一覧（ID 昇順）
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        self.store.list_rooms().await
    }

    /// ルーム詳細。不正な ID も未知の ID も同じ `NotFound`。
    pub async fn room_detail(&self, room_id_raw: &str) -> Result<RoomDetail, RoomQueryError> {
        let room_id = RoomId::new(room_id_raw.trim().to_string())
            .map_err(|_| RoomQueryError::NotFound)?;
        self.store
            .room_detail(&room_id)
            .await
            .ok_or(RoomQueryError::NotFound)
    }
}
