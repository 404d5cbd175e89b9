//! ドメイン層のエラー定義

use thiserror::Error;

/// Value Object の検証エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("value must not be empty")]
    Empty,
    #[error("value exceeds maximum length of {0}")]
    TooLong(usize),
    #[error("invalid room id: '{0}'")]
    InvalidRoomId(String),
    #[error("invalid connection id: '{0}'")]
    InvalidConnectionId(String),
}

/// Room Store の操作エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// 存在しないルームへの参照（要求元にのみ報告される）
    #[error("room not found")]
    RoomNotFound,
    /// ルーム ID の衝突回避リトライが上限に達した
    /// （リクエスト単位の失敗であり、プロセスは落とさない）
    #[error("room id space exhausted after {0} attempts")]
    RoomIdExhausted(u32),
}

/// メッセージ送信エラー
#[derive(Debug, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Persistence Mirror のエラー
///
/// ミラーの失敗は隔離された障害として扱う: ログに残すだけで、
/// ライブセッションには決して伝播しない。
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("mirror write failed: {0}")]
    WriteFailed(String),
    #[error("mirror unavailable: {0}")]
    Unavailable(String),
}
