//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を接続 ID で管理
//! - 接続へのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に
//! 使用します。送信はチャンネルへの enqueue のみで、トランスポート I/O
//! を待つことはありません（遅いクライアントが他の接続を塞がない）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    connections: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, conn: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(conn, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", conn);
    }

    async fn unregister_connection(&self, conn: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(conn);
        tracing::debug!("Connection '{}' unregistered from MessagePusher", conn);
    }

    async fn push_to(&self, conn: &ConnectionId, content: &str) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;

        if let Some(sender) = connections.get(conn) {
            sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed message to connection '{}'", conn);
            Ok(())
        } else {
            Err(MessagePushError::ConnectionNotFound(conn.to_string()))
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;

        for target in targets {
            if let Some(sender) = connections.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                } else {
                    tracing::debug!("Broadcasted message to connection '{}'", target);
                }
            } else {
                tracing::warn!(
                    "Connection '{}' not found during broadcast, skipping",
                    target
                );
            }
        }

        Ok(())
    }
}
