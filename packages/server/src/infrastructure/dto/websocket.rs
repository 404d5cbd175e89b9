//! WebSocket message DTOs.
//!
//! Inbound messages are an internally tagged enum: parsing a frame yields
//! the message kind and payload in one step, and the handler dispatches on
//! the variant. Outbound messages are individual structs carrying a
//! `MessageType` tag, serialized once and fanned out as strings.

use serde::{Deserialize, Serialize};

use crate::domain::{PlaybackState, RosterEntry, RosterSnapshot, Timestamp};

/// Inbound protocol messages, dispatched by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom {
        room_id: String,
        #[serde(default)]
        display_name: Option<String>,
    },
    ChangeVideo {
        video_id: String,
        #[serde(default)]
        start_time_seconds: f64,
    },
    Play {
        time_seconds: f64,
    },
    Pause {
        time_seconds: f64,
    },
    Seek {
        time_seconds: f64,
    },
    RequestSync,
    SyncState {
        target_connection: String,
        state: PlaybackStateDto,
    },
    SetDisplayName {
        display_name: String,
    },
    ChatMessage {
        text: String,
    },
}

/// Outbound message type tags.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    RoomCreated,
    RoomJoined,
    JoinError,
    MemberUpdate,
    UserJoined,
    UserLeft,
    YouAreHost,
    HostChanged,
    ChangeVideo,
    Play,
    Pause,
    Seek,
    SyncState,
    RequestSyncFromHost,
    DisplayNameUpdated,
    DisplayNameChanged,
    ChatMessage,
}

/// Wire shape of a playback state tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStateDto {
    pub video_id: String,
    pub position_seconds: f64,
    pub is_playing: bool,
    #[serde(default)]
    pub last_updated: i64,
}

impl From<PlaybackState> for PlaybackStateDto {
    fn from(state: PlaybackState) -> Self {
        Self {
            video_id: state.video_id,
            position_seconds: state.position_seconds,
            is_playing: state.is_playing,
            last_updated: state.last_updated.value(),
        }
    }
}

impl PlaybackStateDto {
    /// 受信した状態をドメインモデルに変換する（last_updated は受信時刻で上書き）
    pub fn into_domain(self, received_at: Timestamp) -> PlaybackState {
        PlaybackState {
            video_id: self.video_id,
            position_seconds: self.position_seconds,
            is_playing: self.is_playing,
            last_updated: received_at,
        }
    }
}

/// Wire shape of one roster entry.
#[derive(Debug, Clone, Serialize)]
pub struct RoomMemberDto {
    pub id: String,
    pub display_name: String,
    pub is_host: bool,
}

impl From<&RosterEntry> for RoomMemberDto {
    fn from(entry: &RosterEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            display_name: entry.display_name.as_str().to_string(),
            is_host: entry.is_host,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomCreatedMessage {
    pub r#type: MessageType,
    pub ok: bool,
    pub room_id: String,
    pub display_name: String,
    pub is_host: bool,
}

#[derive(Debug, Serialize)]
pub struct RoomJoinedMessage {
    pub r#type: MessageType,
    pub ok: bool,
    pub room_id: String,
    pub display_name: String,
    pub is_host: bool,
    pub member_count: usize,
    pub members: Vec<RoomMemberDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_state: Option<PlaybackStateDto>,
}

#[derive(Debug, Serialize)]
pub struct JoinErrorMessage {
    pub r#type: MessageType,
    pub ok: bool,
    pub reason: String,
}

impl JoinErrorMessage {
    pub fn not_found() -> Self {
        Self {
            r#type: MessageType::JoinError,
            ok: false,
            reason: "not_found".to_string(),
        }
    }
}

/// メンバーシップ変更時の正準ロースター射影。
/// 全てのメンバーシップ操作がこの 1 つの形を使う。
#[derive(Debug, Serialize)]
pub struct MemberUpdateMessage {
    pub r#type: MessageType,
    pub member_count: usize,
    pub members: Vec<RoomMemberDto>,
}

impl From<&RosterSnapshot> for MemberUpdateMessage {
    fn from(roster: &RosterSnapshot) -> Self {
        Self {
            r#type: MessageType::MemberUpdate,
            member_count: roster.member_count,
            members: roster.members.iter().map(RoomMemberDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserJoinedMessage {
    pub r#type: MessageType,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct UserLeftMessage {
    pub r#type: MessageType,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct YouAreHostMessage {
    pub r#type: MessageType,
}

impl YouAreHostMessage {
    pub fn new() -> Self {
        Self {
            r#type: MessageType::YouAreHost,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HostChangedMessage {
    pub r#type: MessageType,
    pub new_host_id: String,
    pub new_host_name: String,
}

#[derive(Debug, Serialize)]
pub struct ChangeVideoMessage {
    pub r#type: MessageType,
    pub video_id: String,
    pub start_time_seconds: f64,
    /// 変更したメンバーの表示名（"X changed the video" 表示用）
    pub by: String,
}

#[derive(Debug, Serialize)]
pub struct PlaybackControlMessage {
    pub r#type: MessageType,
    pub time_seconds: f64,
    pub by: String,
}

#[derive(Debug, Serialize)]
pub struct SyncStateMessage {
    pub r#type: MessageType,
    pub state: PlaybackStateDto,
}

#[derive(Debug, Serialize)]
pub struct RequestSyncFromHostMessage {
    pub r#type: MessageType,
    pub target_connection: String,
}

#[derive(Debug, Serialize)]
pub struct DisplayNameUpdatedMessage {
    pub r#type: MessageType,
    pub ok: bool,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct DisplayNameChangedMessage {
    pub r#type: MessageType,
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Serialize)]
pub struct ChatBroadcastMessage {
    pub r#type: MessageType,
    pub display_name: String,
    pub text: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, DisplayName};

    #[test]
    fn test_client_message_dispatch_by_type_tag() {
        // テスト項目: type タグで受信メッセージが正しい variant にパースされる
        // given (前提条件):
        let join = r#"{"type":"join_room","room_id":"abc123","display_name":"alice"}"#;
        let play = r#"{"type":"play","time_seconds":12.5}"#;
        let create = r#"{"type":"create_room"}"#;

        // when (操作):
        let join_msg: ClientMessage = serde_json::from_str(join).unwrap();
        let play_msg: ClientMessage = serde_json::from_str(play).unwrap();
        let create_msg: ClientMessage = serde_json::from_str(create).unwrap();

        // then (期待する結果):
        assert!(matches!(
            join_msg,
            ClientMessage::JoinRoom { ref room_id, ref display_name }
                if room_id == "abc123" && display_name.as_deref() == Some("alice")
        ));
        assert!(matches!(
            play_msg,
            ClientMessage::Play { time_seconds } if time_seconds == 12.5
        ));
        assert!(matches!(create_msg, ClientMessage::CreateRoom));
    }

    #[test]
    fn test_join_room_display_name_is_optional() {
        // テスト項目: display_name 省略時に None になる
        // given (前提条件):
        let join = r#"{"type":"join_room","room_id":"abc123"}"#;

        // when (操作):
        let msg: ClientMessage = serde_json::from_str(join).unwrap();

        // then (期待する結果):
        assert!(matches!(
            msg,
            ClientMessage::JoinRoom { display_name: None, .. }
        ));
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        // テスト項目: 未知の type を持つメッセージがパースエラーになる
        // given (前提条件):
        let unknown = r#"{"type":"format_disk"}"#;

        // when (操作):
        let result: Result<ClientMessage, _> = serde_json::from_str(unknown);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_member_update_is_canonical_roster_projection() {
        // テスト項目: MemberUpdateMessage がロースターを正しく射影する
        // given (前提条件):
        let host = ConnectionId::generate();
        let roster = RosterSnapshot {
            member_count: 1,
            members: vec![crate::domain::RosterEntry {
                id: host,
                display_name: DisplayName::new("alice".to_string()).unwrap(),
                is_host: true,
            }],
        };

        // when (操作):
        let msg = MemberUpdateMessage::from(&roster);
        let json = serde_json::to_string(&msg).unwrap();

        // then (期待する結果):
        assert_eq!(msg.member_count, 1);
        assert!(json.contains(r#""type":"member_update""#));
        assert!(json.contains(r#""is_host":true"#));
        assert!(json.contains(&host.to_string()));
    }

    #[test]
    fn test_playback_state_dto_roundtrip() {
        // テスト項目: 再生状態がドメイン ⇔ DTO で往復できる
        // given (前提条件):
        let state = PlaybackState {
            video_id: "abc123xyz".to_string(),
            position_seconds: 30.0,
            is_playing: false,
            last_updated: Timestamp::new(5000),
        };

        // when (操作):
        let dto = PlaybackStateDto::from(state.clone());
        let back = dto.into_domain(Timestamp::new(5000));

        // then (期待する結果):
        assert_eq!(back, state);
    }

    #[test]
    fn test_room_joined_omits_absent_playback_state() {
        // テスト項目: 再生状態が無い参加応答に playback_state キーが現れない
        // given (前提条件):
        let msg = RoomJoinedMessage {
            r#type: MessageType::RoomJoined,
            ok: true,
            room_id: "abc123".to_string(),
            display_name: "alice".to_string(),
            is_host: true,
            member_count: 1,
            members: vec![],
            playback_state: None,
        };

        // when (操作):
        let json = serde_json::to_string(&msg).unwrap();

        // then (期待する結果):
        assert!(!json.contains("playback_state"));
    }
}
