//! UI 層（トランスポート境界）
//!
//! axum のルーター、HTTP / WebSocket ハンドラ、シグナル処理。

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
