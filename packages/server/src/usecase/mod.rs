//! UseCase 層
//!
//! プロトコルの 1 操作 = 1 メソッド。ドメイン層の trait
//! （Store / Pusher / Mirror）を協調させ、送信メッセージの組み立てと
//! ファンアウトまでを担います。トランスポート（WebSocket / HTTP）の
//! 詳細は UI 層に任せます。

mod error;
mod playback;
mod presence_chat;
mod room_query;
mod room_session;

pub use error::{CreateRoomError, JoinRoomError, RoomQueryError};
pub use playback::PlaybackUseCase;
pub use presence_chat::PresenceChatUseCase;
pub use room_query::RoomQueryUseCase;
pub use room_session::RoomSessionUseCase;

use std::future::Future;

use crate::domain::MirrorError;

/// 永続ミラーへの書き込みを fire-and-forget で発行する。
/// ミラーの失敗・遅延がリアルタイム経路を止めることはない。
pub(crate) fn spawn_mirror_write<F>(label: &'static str, fut: F)
where
    F: Future<Output = Result<(), MirrorError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            tracing::warn!("mirror write `{}` failed: {}", label, e);
        }
    });
}
