//! Infrastructure 層
//!
//! ドメイン層が定義する trait の具体的な実装と、プロトコル境界の
//! DTO を提供します。

pub mod dto;
pub mod message_pusher;
pub mod mirror;
pub mod registry;
pub mod store;
pub mod youtube;

pub use message_pusher::WebSocketMessagePusher;
pub use mirror::LoggingMirror;
pub use registry::{ConnectionRegistry, ConnectionSession};
pub use store::InMemoryRoomStore;
pub use youtube::YouTubeSearchClient;
