//! Room Store trait 定義
//!
//! ドメイン層が必要とするルームテーブルへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 原子性
//!
//! 各操作は「読み取り・変更・スナップショット生成」を単一のクリティカル
//! セクション内で完結させる複合操作です。呼び出し側が受け取るスナップ
//! ショットは、ある一貫した瞬間に実在した状態を必ず反映します
//! （半適用のメンバーシップ変更が観測されることはない）。

use async_trait::async_trait;

use super::entity::{Departure, PlaybackControl, PlaybackState, RosterSnapshot};
use super::error::StoreError;
use super::value_object::{ConnectionId, DisplayName, RoomId, Timestamp};

/// `create_room` の結果スナップショット
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub room_id: RoomId,
    pub roster: RosterSnapshot,
}

/// `join_room` の結果スナップショット
///
/// 参加応答に必要な情報を全て持つ。再生状態の整合は参加応答の一部として
/// 届けられる（後続メッセージとのレースを排除する）。
#[derive(Debug, Clone)]
pub struct JoinedRoom {
    pub room_id: RoomId,
    pub is_host: bool,
    pub roster: RosterSnapshot,
    pub playback: Option<PlaybackState>,
}

/// `leave_room` の結果
#[derive(Debug, Clone)]
pub enum LeaveOutcome {
    /// 最後のメンバーが離脱し、ルームは離脱と同時に削除された
    RoomDeleted { departed_name: DisplayName },
    /// メンバーが残っている
    MemberLeft {
        departed_name: DisplayName,
        /// ホスト移譲が起きた場合の新ホスト
        new_host: Option<ConnectionId>,
        /// 離脱適用後のロースター
        roster: RosterSnapshot,
    },
}

impl LeaveOutcome {
    pub(crate) fn from_departure(departure: Departure, roster: Option<RosterSnapshot>) -> Self {
        if departure.now_empty {
            LeaveOutcome::RoomDeleted {
                departed_name: departure.departed_name,
            }
        } else {
            LeaveOutcome::MemberLeft {
                departed_name: departure.departed_name,
                new_host: departure.new_host,
                // 空でない離脱ではロースターが必ず存在する
                roster: roster.unwrap_or(RosterSnapshot {
                    member_count: 0,
                    members: Vec::new(),
                }),
            }
        }
    }
}

/// REST 射影: ルーム一覧の 1 行
#[derive(Debug, Clone)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub roster: RosterSnapshot,
    pub created_at: Timestamp,
}

/// REST 射影: ルーム詳細
#[derive(Debug, Clone)]
pub struct RoomDetail {
    pub room_id: RoomId,
    pub roster: RosterSnapshot,
    pub playback: Option<PlaybackState>,
    pub created_at: Timestamp,
}

/// Room Store trait
///
/// プロセス内で生きている全ルームの単一の情報源。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には
/// 依存しない。
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// ルームを新規作成し、作成者を唯一のメンバー兼ホストとして登録する。
    /// ID は内部で生成し、衝突時は上限付きでリトライする。
    async fn create_room(
        &self,
        host: ConnectionId,
        host_name: DisplayName,
        now: Timestamp,
    ) -> Result<CreatedRoom, StoreError>;

    /// ルームに参加する。存在しなければ `RoomNotFound`。
    async fn join_room(
        &self,
        room_id: &RoomId,
        conn: ConnectionId,
        name: DisplayName,
        now: Timestamp,
    ) -> Result<JoinedRoom, StoreError>;

    /// ルームから離脱する。ルームかメンバーが存在しなければ `None`
    /// （切断との良性レースなのでエラーにしない）。
    /// 最後のメンバーの離脱ではルーム削除まで同一クリティカル
    /// セクション内で行う（空ルームは観測不能）。
    async fn leave_room(&self, room_id: &RoomId, conn: &ConnectionId) -> Option<LeaveOutcome>;

    /// 再生状態を丸ごと差し替える（change_video / sync_state キャッシュ更新）。
    /// ルームが存在しなければ `false`。
    async fn set_playback(&self, room_id: &RoomId, state: PlaybackState) -> bool;

    /// コントロールイベントをキャッシュ済み状態に適用する。
    /// 返り値はルームが存在した場合の適用後状態
    /// （キャッシュが無ければ `Ok(None)`、イベント自体は中継してよい）。
    async fn apply_control(
        &self,
        room_id: &RoomId,
        control: PlaybackControl,
        time_seconds: f64,
        now: Timestamp,
    ) -> Result<Option<PlaybackState>, StoreError>;

    /// キャッシュ済み再生状態を取得する
    async fn playback(&self, room_id: &RoomId) -> Option<PlaybackState>;

    /// 現在のホストを取得する
    async fn host_of(&self, room_id: &RoomId) -> Option<ConnectionId>;

    /// メンバーの表示名を更新し、更新後のロースターを返す。
    /// ルームかメンバーが存在しなければ `None`。
    async fn rename_member(
        &self,
        room_id: &RoomId,
        conn: &ConnectionId,
        name: DisplayName,
    ) -> Option<RosterSnapshot>;

    /// ロースターのスナップショットを取得する
    async fn roster(&self, room_id: &RoomId) -> Option<RosterSnapshot>;

    /// ルームの全メンバーの接続 ID を取得する（存在しなければ空）
    async fn member_ids(&self, room_id: &RoomId) -> Vec<ConnectionId>;

    /// `created_at` が `cutoff` より古いルームを削除し、削除した ID を返す。
    /// メンバーシップ状態とは無関係（リークガード）。
    async fn sweep_expired(&self, cutoff: Timestamp) -> Vec<RoomId>;

    /// 生きている全ルームの一覧射影
    async fn list_rooms(&self) -> Vec<RoomSummary>;

    /// ルーム詳細射影
    async fn room_detail(&self, room_id: &RoomId) -> Option<RoomDetail>;
}
