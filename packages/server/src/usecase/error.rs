//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::StoreError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreateRoomError {
    /// ID 生成のリトライが上限に達した（テーブルがほぼ満杯）
    #[error("room id space exhausted after {0} attempts")]
    IdExhausted(u32),
    /// ストアから返されたその他のエラー
    #[error("room creation failed: {0}")]
    Store(#[source] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinRoomError {
    /// 存在しないか、形式不正なルーム ID（外部からは区別しない）
    #[error("room not found")]
    NotFound,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomQueryError {
    #[error("room not found")]
    NotFound,
}
