//! ドメイン層のエンティティ定義
//!
//! `Room` はメンバーシップ・ホスト権限・再生状態を持つ集約ルート。
//! 不変条件:
//! - ルームが存在する間、メンバーは 1 人以上
//! - `host` は常に `members` のキーに含まれる
//!
//! 最後のメンバー削除によるルーム削除は Store の責務
//! （`remove_member` は空になったことを `Departure::now_empty` で返す）。

use std::collections::BTreeMap;

use super::value_object::{ConnectionId, DisplayName, RoomId, Timestamp};

/// ルームメンバー情報
///
/// 所属する Room の member マップの外では同一性を持たない。
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub display_name: DisplayName,
    pub joined_at: Timestamp,
}

/// ホストが最後に報告した再生状態
///
/// サーバーは経過時間から現在位置を外挿しない。最後に知らされた
/// タプルをそのまま保持し、遅れて参加したクライアントに渡すだけ。
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub video_id: String,
    pub position_seconds: f64,
    pub is_playing: bool,
    pub last_updated: Timestamp,
}

/// 再生コントロールの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackControl {
    Play,
    Pause,
    Seek,
}

impl PlaybackState {
    /// コントロールイベントをキャッシュ済み状態に適用する
    pub fn apply(&mut self, control: PlaybackControl, time_seconds: f64, now: Timestamp) {
        match control {
            PlaybackControl::Play => {
                self.is_playing = true;
                self.position_seconds = time_seconds;
            }
            PlaybackControl::Pause => {
                self.is_playing = false;
                self.position_seconds = time_seconds;
            }
            PlaybackControl::Seek => {
                self.position_seconds = time_seconds;
            }
        }
        self.last_updated = now;
    }
}

/// ロースター（メンバー一覧）のスナップショット
///
/// メンバーシップに影響する全ての操作が使う唯一の正準射影。
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSnapshot {
    pub member_count: usize,
    pub members: Vec<RosterEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: ConnectionId,
    pub display_name: DisplayName,
    pub is_host: bool,
}

/// メンバー離脱の結果
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    /// 離脱したメンバーの表示名
    pub departed_name: DisplayName,
    /// ホスト離脱によって新たにホストになったメンバー（いれば）
    pub new_host: Option<ConnectionId>,
    /// 離脱後にルームが空になったか（空なら Store が削除する）
    pub now_empty: bool,
}

/// 視聴セッションのルーム
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    host: ConnectionId,
    /// BTreeMap なのでロースターの列挙順は常に決定的
    members: BTreeMap<ConnectionId, MemberInfo>,
    pub playback: Option<PlaybackState>,
    pub created_at: Timestamp,
}

impl Room {
    /// 作成者を唯一のメンバー兼ホストとしてルームを作る
    pub fn new(
        id: RoomId,
        host: ConnectionId,
        host_name: DisplayName,
        created_at: Timestamp,
    ) -> Self {
        let mut members = BTreeMap::new();
        members.insert(
            host,
            MemberInfo {
                display_name: host_name,
                joined_at: created_at,
            },
        );
        Self {
            id,
            host,
            members,
            playback: None,
            created_at,
        }
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn is_host(&self, id: &ConnectionId) -> bool {
        self.host == *id
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, id: &ConnectionId) -> bool {
        self.members.contains_key(id)
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.keys().copied().collect()
    }

    /// メンバーを追加する。既存メンバーの再参加では `joined_at` を
    /// 維持したまま表示名だけを更新する。
    pub fn insert_member(&mut self, id: ConnectionId, name: DisplayName, joined_at: Timestamp) {
        self.members
            .entry(id)
            .and_modify(|info| info.display_name = name.clone())
            .or_insert(MemberInfo {
                display_name: name,
                joined_at,
            });
    }

    /// メンバーを削除する。メンバーでなければ `None`。
    ///
    /// 離脱者がホストで残存メンバーがいる場合、決定的な後継選出
    /// （最古の `joined_at`、同着なら最小の接続 ID）でホストを移譲する。
    pub fn remove_member(&mut self, id: &ConnectionId) -> Option<Departure> {
        let removed = self.members.remove(id)?;

        let mut new_host = None;
        if self.host == *id
            && let Some(successor) = self.choose_successor()
        {
            self.host = successor;
            new_host = Some(successor);
        }

        Some(Departure {
            departed_name: removed.display_name,
            new_host,
            now_empty: self.members.is_empty(),
        })
    }

    /// ホスト後継の選出: 最古の `joined_at`、同着なら最小の接続 ID
    fn choose_successor(&self) -> Option<ConnectionId> {
        self.members
            .iter()
            .min_by_key(|(id, info)| (info.joined_at, **id))
            .map(|(id, _)| *id)
    }

    /// メンバーの表示名を更新する。メンバーでなければ `false`。
    pub fn rename_member(&mut self, id: &ConnectionId, name: DisplayName) -> bool {
        match self.members.get_mut(id) {
            Some(info) => {
                info.display_name = name;
                true
            }
            None => false,
        }
    }

    /// 正準ロースター射影を生成する
    pub fn roster(&self) -> RosterSnapshot {
        RosterSnapshot {
            member_count: self.members.len(),
            members: self
                .members
                .iter()
                .map(|(id, info)| RosterEntry {
                    id: *id,
                    display_name: info.display_name.clone(),
                    is_host: self.host == *id,
                })
                .collect(),
        }
    }

    pub fn member(&self, id: &ConnectionId) -> Option<&MemberInfo> {
        self.members.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> DisplayName {
        DisplayName::new(s.to_string()).unwrap()
    }

    fn test_room(host: ConnectionId) -> Room {
        Room::new(
            RoomId::new("abc123".to_string()).unwrap(),
            host,
            name("host"),
            Timestamp::new(1000),
        )
    }

    #[test]
    fn test_new_room_has_creator_as_sole_member_and_host() {
        // テスト項目: 作成直後のルームは作成者が唯一のメンバー兼ホスト
        // given (前提条件):
        let creator = ConnectionId::generate();

        // when (操作):
        let room = test_room(creator);

        // then (期待する結果):
        assert_eq!(room.member_count(), 1);
        assert!(room.is_host(&creator));
        assert!(room.is_member(&creator));
        assert!(room.playback.is_none());
    }

    #[test]
    fn test_rejoin_keeps_joined_at_and_updates_name() {
        // テスト項目: 再参加では joined_at を維持し表示名のみ更新される
        // given (前提条件):
        let host = ConnectionId::generate();
        let mut room = test_room(host);

        // when (操作): ホストが別名で再参加
        room.insert_member(host, name("renamed"), Timestamp::new(9999));

        // then (期待する結果):
        let info = room.member(&host).unwrap();
        assert_eq!(info.display_name.as_str(), "renamed");
        assert_eq!(info.joined_at, Timestamp::new(1000));
    }

    #[test]
    fn test_remove_last_member_reports_empty() {
        // テスト項目: 最後のメンバー離脱で now_empty が報告される
        // given (前提条件):
        let host = ConnectionId::generate();
        let mut room = test_room(host);

        // when (操作):
        let departure = room.remove_member(&host).unwrap();

        // then (期待する結果):
        assert!(departure.now_empty);
        assert_eq!(departure.departed_name.as_str(), "host");
        assert_eq!(room.member_count(), 0);
    }

    #[test]
    fn test_remove_nonmember_returns_none() {
        // テスト項目: メンバーでない接続の削除は None を返す
        // given (前提条件):
        let host = ConnectionId::generate();
        let mut room = test_room(host);

        // when (操作):
        let result = room.remove_member(&ConnectionId::generate());

        // then (期待する結果):
        assert!(result.is_none());
        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_host_failover_picks_oldest_member() {
        // テスト項目: ホスト離脱時、最古の joined_at を持つメンバーが後継になる
        // given (前提条件):
        let host = ConnectionId::generate();
        let second = ConnectionId::generate();
        let third = ConnectionId::generate();
        let mut room = test_room(host);
        room.insert_member(second, name("second"), Timestamp::new(2000));
        room.insert_member(third, name("third"), Timestamp::new(3000));

        // when (操作): ホストが離脱
        let departure = room.remove_member(&host).unwrap();

        // then (期待する結果): 参加が最も古い second が後継
        assert_eq!(departure.new_host, Some(second));
        assert!(room.is_host(&second));
        assert!(!departure.now_empty);
    }

    #[test]
    fn test_host_failover_tie_breaks_by_connection_id() {
        // テスト項目: joined_at が同着の場合は最小の接続 ID が後継になる
        // given (前提条件):
        let host = ConnectionId::generate();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        let mut room = test_room(host);
        room.insert_member(a, name("a"), Timestamp::new(2000));
        room.insert_member(b, name("b"), Timestamp::new(2000));
        let expected = std::cmp::min(a, b);

        // when (操作):
        let departure = room.remove_member(&host).unwrap();

        // then (期待する結果):
        assert_eq!(departure.new_host, Some(expected));
    }

    #[test]
    fn test_host_failover_is_deterministic() {
        // テスト項目: 同じメンバー構成なら後継選出は毎回同じ
        // given (前提条件):
        let host = ConnectionId::generate();
        let second = ConnectionId::generate();
        let third = ConnectionId::generate();

        let build = || {
            let mut room = test_room(host);
            room.insert_member(second, name("second"), Timestamp::new(2000));
            room.insert_member(third, name("third"), Timestamp::new(2000));
            room
        };

        // when (操作): 同一構成のルームで 2 回失効させる
        let first_pick = build().remove_member(&host).unwrap().new_host;
        let second_pick = build().remove_member(&host).unwrap().new_host;

        // then (期待する結果):
        assert_eq!(first_pick, second_pick);
        assert!(first_pick.is_some());
    }

    #[test]
    fn test_nonhost_departure_keeps_host() {
        // テスト項目: ホスト以外の離脱ではホストが変わらない
        // given (前提条件):
        let host = ConnectionId::generate();
        let member = ConnectionId::generate();
        let mut room = test_room(host);
        room.insert_member(member, name("member"), Timestamp::new(2000));

        // when (操作):
        let departure = room.remove_member(&member).unwrap();

        // then (期待する結果):
        assert_eq!(departure.new_host, None);
        assert!(room.is_host(&host));
    }

    #[test]
    fn test_roster_is_deterministic_and_marks_host() {
        // テスト項目: ロースターの列挙順が決定的で、ホストに注釈が付く
        // given (前提条件):
        let host = ConnectionId::generate();
        let member = ConnectionId::generate();
        let mut room = test_room(host);
        room.insert_member(member, name("member"), Timestamp::new(2000));

        // when (操作):
        let roster1 = room.roster();
        let roster2 = room.roster();

        // then (期待する結果):
        assert_eq!(roster1, roster2);
        assert_eq!(roster1.member_count, 2);
        let hosts: Vec<_> = roster1.members.iter().filter(|m| m.is_host).collect();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].id, host);
    }

    #[test]
    fn test_playback_apply_play_pause_seek() {
        // テスト項目: play/pause/seek がキャッシュ済みタプルを正しく更新する
        // given (前提条件):
        let mut state = PlaybackState {
            video_id: "abc123xyz".to_string(),
            position_seconds: 30.0,
            is_playing: false,
            last_updated: Timestamp::new(1000),
        };

        // when (操作): pause(42) → play(42) → seek(100)
        state.apply(PlaybackControl::Pause, 42.0, Timestamp::new(2000));
        assert!(!state.is_playing);
        assert_eq!(state.position_seconds, 42.0);

        state.apply(PlaybackControl::Play, 42.0, Timestamp::new(3000));

        // then (期待する結果): pause 後の play で is_playing=true, position=42
        assert!(state.is_playing);
        assert_eq!(state.position_seconds, 42.0);

        state.apply(PlaybackControl::Seek, 100.0, Timestamp::new(4000));
        // seek は再生フラグを変えない
        assert!(state.is_playing);
        assert_eq!(state.position_seconds, 100.0);
        assert_eq!(state.last_updated, Timestamp::new(4000));
    }
}
