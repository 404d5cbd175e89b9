//! Server state shared across handlers.

use std::sync::Arc;

use crate::infrastructure::YouTubeSearchClient;
use crate::usecase::{PlaybackUseCase, PresenceChatUseCase, RoomQueryUseCase, RoomSessionUseCase};

/// Shared application state
pub struct AppState {
    /// RoomSessionUseCase（ルームライフサイクルのユースケース）
    pub room_session: Arc<RoomSessionUseCase>,
    /// PlaybackUseCase（再生状態同期のユースケース）
    pub playback: Arc<PlaybackUseCase>,
    /// PresenceChatUseCase（表示名・チャットのユースケース）
    pub presence_chat: Arc<PresenceChatUseCase>,
    /// RoomQueryUseCase（REST 照会のユースケース）
    pub room_query: Arc<RoomQueryUseCase>,
    /// 動画検索プロキシ。API キー未設定のデプロイでは `None`
    pub youtube: Option<Arc<YouTubeSearchClient>>,
}
