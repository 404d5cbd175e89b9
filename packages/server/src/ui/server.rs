//! Server execution logic.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use tokio::time::MissedTickBehavior;
use tower_http::trace::TraceLayer;

use super::{
    handler::{get_room_detail, get_rooms, health_check, search_videos, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Watch-together hub server
///
/// Wires the shared application state into an axum router and runs it
/// with a background expiry sweeper and graceful shutdown.
pub struct Server {
    app_state: Arc<AppState>,
    /// ルームの保持期間。`created_at` がこれより古いルームは掃除される
    retention: Duration,
    /// 掃除の実行間隔
    sweep_interval: Duration,
}

impl Server {
    pub fn new(app_state: Arc<AppState>, retention: Duration, sweep_interval: Duration) -> Self {
        Self {
            app_state,
            retention,
            sweep_interval,
        }
    }

    /// Run the server until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // 期限切れルームの定期掃除
        let sweeper = {
            let room_session = self.app_state.room_session.clone();
            let retention = self.retention;
            let mut interval = tokio::time::interval(self.sweep_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tokio::spawn(async move {
                loop {
                    interval.tick().await;
                    room_session.sweep_expired(retention).await;
                }
            })
        };

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/search", get(search_videos))
            .layer(TraceLayer::new_for_http())
            .with_state(self.app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Watch-together hub listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        sweeper.abort();
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
