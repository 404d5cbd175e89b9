//! Watch-together synchronization hub server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin issho-server
//! cargo run --bin issho-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use issho_server::{
    infrastructure::{
        ConnectionRegistry, InMemoryRoomStore, LoggingMirror, WebSocketMessagePusher,
        YouTubeSearchClient,
    },
    ui::{AppState, Server},
    usecase::{PlaybackUseCase, PresenceChatUseCase, RoomQueryUseCase, RoomSessionUseCase},
};
use issho_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "issho-server")]
#[command(about = "Watch-together synchronization hub", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Room retention in hours (rooms older than this are swept)
    #[arg(long, default_value = "24")]
    retention_hours: u64,

    /// Expiry sweep interval in seconds
    #[arg(long, default_value = "3600")]
    sweep_interval_secs: u64,

    /// YouTube Data API key for /api/search (falls back to YOUTUBE_API_KEY)
    #[arg(long)]
    youtube_api_key: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. RoomStore / MessagePusher / ConnectionRegistry / PersistenceMirror
    // 2. UseCases
    // 3. AppState
    // 4. Server

    let store = Arc::new(InMemoryRoomStore::new());
    let pusher = Arc::new(WebSocketMessagePusher::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let mirror = Arc::new(LoggingMirror::new());

    let room_session = Arc::new(RoomSessionUseCase::new(
        store.clone(),
        pusher.clone(),
        registry.clone(),
        mirror.clone(),
    ));
    let playback = Arc::new(PlaybackUseCase::new(
        store.clone(),
        pusher.clone(),
        registry.clone(),
        mirror.clone(),
    ));
    let presence_chat = Arc::new(PresenceChatUseCase::new(
        store.clone(),
        pusher.clone(),
        registry.clone(),
        mirror.clone(),
    ));
    let room_query = Arc::new(RoomQueryUseCase::new(store.clone()));

    let api_key = args
        .youtube_api_key
        .or_else(|| std::env::var("YOUTUBE_API_KEY").ok());
    let youtube = match api_key {
        Some(key) if !key.is_empty() => Some(Arc::new(YouTubeSearchClient::new(key))),
        _ => {
            tracing::info!("no YouTube API key configured, /api/search is disabled");
            None
        }
    };

    let app_state = Arc::new(AppState {
        room_session,
        playback,
        presence_chat,
        room_query,
        youtube,
    });

    let server = Server::new(
        app_state,
        Duration::from_secs(args.retention_hours * 3600),
        Duration::from_secs(args.sweep_interval_secs),
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
