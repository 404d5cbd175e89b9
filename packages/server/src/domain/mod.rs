//! ドメイン層
//!
//! Value Object、エンティティ、および外側のレイヤーに要求する
//! インターフェース（Store / Pusher / Mirror）を定義します。

pub mod entity;
mod error;
mod mirror;
mod pusher;
mod store;
pub mod value_object;

pub use entity::{
    Departure, MemberInfo, PlaybackControl, PlaybackState, Room, RosterEntry, RosterSnapshot,
};
pub use error::{MessagePushError, MirrorError, StoreError, ValidationError};
pub use mirror::PersistenceMirror;
pub use pusher::{MessagePusher, PusherChannel};
pub use store::{CreatedRoom, JoinedRoom, LeaveOutcome, RoomDetail, RoomStore, RoomSummary};
pub use value_object::{
    ConnectionId, DisplayName, DisplayNameFactory, MessageContent, RoomId, RoomIdFactory,
    Timestamp,
};

#[cfg(test)]
pub use mirror::MockPersistenceMirror;
