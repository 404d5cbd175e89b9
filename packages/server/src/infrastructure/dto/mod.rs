//! Data Transfer Objects (DTOs) for the watch-together hub.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `http`: HTTP API response DTOs

pub mod http;
pub mod websocket;

pub use http::{RoomDetailDto, RoomSummaryDto};
pub use websocket::{
    ChangeVideoMessage, ChatBroadcastMessage, ClientMessage, DisplayNameChangedMessage,
    DisplayNameUpdatedMessage, HostChangedMessage, JoinErrorMessage, MemberUpdateMessage,
    MessageType, PlaybackControlMessage, PlaybackStateDto, RequestSyncFromHostMessage,
    RoomCreatedMessage, RoomJoinedMessage, RoomMemberDto, SyncStateMessage, UserJoinedMessage,
    UserLeftMessage, YouAreHostMessage,
};
