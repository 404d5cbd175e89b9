//! WebSocket connection handlers.
//!
//! 1 接続 = 1 ソケット = 1 `ConnectionId`。受信フレームを
//! `ClientMessage` にパースして UseCase へディスパッチし、送信は
//! 接続ごとのチャンネルを吸い上げる pusher ループが担う。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, PlaybackControl},
    infrastructure::dto::ClientMessage,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's channel into the WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // 接続 ID はサーバー側で採番する（クライアントは自称できない）
    let conn = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    let display_name = state.room_session.connect(conn, tx).await;
    tracing::info!("connection {} opened as {}", conn, display_name);

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("websocket error on {}: {}", conn, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch(&recv_state, conn, &text).await;
                }
                Message::Close(_) => {
                    tracing::debug!("connection {} requested close", conn);
                    break;
                }
                // ping/pong はプロトコルレベルで処理される
                _ => {}
            }
        }
    });

    // どちらかのタスクが終わったら相方を落とす
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 切断 = 離脱。所属ルームへの通知まで UseCase 側で行われる
    state.room_session.disconnect(conn).await;
}

/// 受信フレームのディスパッチ。パースできないフレームは応答なしで破棄する。
async fn dispatch(state: &Arc<AppState>, conn: ConnectionId, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("unparseable frame from {}: {}", conn, e);
            return;
        }
    };

    match message {
        ClientMessage::CreateRoom => {
            // 失敗は UseCase 側でログ済み
            let _ = state.room_session.create_room(conn).await;
        }
        ClientMessage::JoinRoom {
            room_id,
            display_name,
        } => {
            let _ = state.room_session.join_room(conn, &room_id, display_name).await;
        }
        ClientMessage::ChangeVideo {
            video_id,
            start_time_seconds,
        } => {
            state
                .playback
                .change_video(conn, video_id, start_time_seconds)
                .await;
        }
        ClientMessage::Play { time_seconds } => {
            state
                .playback
                .control(conn, PlaybackControl::Play, time_seconds)
                .await;
        }
        ClientMessage::Pause { time_seconds } => {
            state
                .playback
                .control(conn, PlaybackControl::Pause, time_seconds)
                .await;
        }
        ClientMessage::Seek { time_seconds } => {
            state
                .playback
                .control(conn, PlaybackControl::Seek, time_seconds)
                .await;
        }
        ClientMessage::RequestSync => {
            state.playback.request_sync(conn).await;
        }
        ClientMessage::SyncState {
            target_connection,
            state: playback_state,
        } => {
            state
                .playback
                .report_sync_state(conn, &target_connection, playback_state)
                .await;
        }
        ClientMessage::SetDisplayName { display_name } => {
            state.presence_chat.rename(conn, display_name).await;
        }
        ClientMessage::ChatMessage { text } => {
            state.presence_chat.post_chat(conn, text).await;
        }
    }
}
