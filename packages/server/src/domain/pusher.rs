//! メッセージ送信（通知）の trait 定義
//!
//! UseCase 層が接続へのメッセージ送信に使うインターフェース。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::value_object::ConnectionId;

/// 接続ごとの送信チャンネル
///
/// トランスポート I/O 待ちでルームのロックを保持しないよう、
/// 送信は常に unbounded チャンネル経由で行う。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// メッセージ送信の抽象化
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録する
    async fn register_connection(&self, conn: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを登録解除する
    async fn unregister_connection(&self, conn: &ConnectionId);

    /// 特定の接続にメッセージを送信する
    async fn push_to(&self, conn: &ConnectionId, content: &str) -> Result<(), MessagePushError>;

    /// 複数の接続にメッセージを送信する（部分失敗を許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
