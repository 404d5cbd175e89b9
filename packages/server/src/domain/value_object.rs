//! ドメイン層の Value Object 定義
//!
//! 不正な値を型レベルで排除するため、全ての Value Object は
//! 検証付きコンストラクタ（`new` → `Result`）を持ちます。

use std::fmt;

use rand::Rng;
use uuid::Uuid;

use super::error::ValidationError;

/// ルーム ID（短い推測困難なトークン）
///
/// `[a-z0-9]` の 6 文字。生成は `RoomIdFactory` が行い、
/// 衝突回避は Room Store 側の責務。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub const TOKEN_LEN: usize = 6;

    /// 検証付きコンストラクタ
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.len() != Self::TOKEN_LEN
            || !value
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(ValidationError::InvalidRoomId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルーム ID の生成器
///
/// 固定アルファベット・固定長のランダムトークンを生成する。
/// 一意性は保証しない（Store 側で衝突チェックを行う）。
pub struct RoomIdFactory;

impl RoomIdFactory {
    const ALPHABET: &'static [u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    /// 新しいルーム ID を生成
    pub fn generate() -> RoomId {
        let mut rng = rand::rng();
        let token: String = (0..RoomId::TOKEN_LEN)
            .map(|_| Self::ALPHABET[rng.random_range(0..Self::ALPHABET.len())] as char)
            .collect();
        RoomId(token)
    }
}

/// 接続 ID（トランスポート接続ごとにサーバーが採番する不透明な識別子）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// 新しい接続 ID を採番
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// 文字列表現（プロトコルメッセージ内の接続参照）からパース
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValidationError::InvalidConnectionId(value.to_string()))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 表示名
///
/// 前後の空白を除去した上で、空でなく 64 文字以内であることを保証する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub const MAX_LEN: usize = 64;

    /// 検証付きコンストラクタ（trim 済みの値を保持）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(ValidationError::TooLong(Self::MAX_LEN));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 初回接続時に割り当てるランダムな既定表示名の生成器
pub struct DisplayNameFactory;

impl DisplayNameFactory {
    /// `User1000`〜`User9999` の既定表示名を生成
    pub fn random() -> DisplayName {
        let n: u16 = rand::rng().random_range(1000..=9999);
        DisplayName(format!("User{n}"))
    }
}

/// チャットメッセージ本文
///
/// 空白のみのメッセージを型レベルで排除する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub const MAX_LEN: usize = 500;

    /// 検証付きコンストラクタ（trim 済みの値を保持）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(ValidationError::TooLong(Self::MAX_LEN));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_accepts_valid_token() {
        // テスト項目: 正しい形式のルーム ID が受理される
        // given (前提条件):
        let value = "abc123".to_string();

        // when (操作):
        let result = RoomId::new(value);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_room_id_rejects_wrong_length() {
        // テスト項目: 長さが 6 でないルーム ID が拒否される
        // given (前提条件):
        let too_short = "abc12".to_string();
        let too_long = "abc1234".to_string();

        // when (操作):
        let short_result = RoomId::new(too_short);
        let long_result = RoomId::new(too_long);

        // then (期待する結果):
        assert!(short_result.is_err());
        assert!(long_result.is_err());
    }

    #[test]
    fn test_room_id_rejects_invalid_characters() {
        // テスト項目: アルファベット外の文字を含むルーム ID が拒否される
        // given (前提条件):
        let uppercase = "ABC123".to_string();
        let symbol = "abc#12".to_string();

        // when (操作):
        let uppercase_result = RoomId::new(uppercase);
        let symbol_result = RoomId::new(symbol);

        // then (期待する結果):
        assert!(uppercase_result.is_err());
        assert!(symbol_result.is_err());
    }

    #[test]
    fn test_room_id_factory_generates_valid_tokens() {
        // テスト項目: RoomIdFactory が常に正しい形式のトークンを生成する
        // given (前提条件):

        // when (操作):
        for _ in 0..100 {
            let id = RoomIdFactory::generate();

            // then (期待する結果): 再検証を通過する
            assert!(RoomId::new(id.as_str().to_string()).is_ok());
        }
    }

    #[test]
    fn test_connection_id_roundtrip_through_string() {
        // テスト項目: 接続 ID が文字列を介して往復できる
        // given (前提条件):
        let id = ConnectionId::generate();

        // when (操作):
        let parsed = ConnectionId::parse(&id.to_string());

        // then (期待する結果):
        assert_eq!(parsed, Ok(id));
    }

    #[test]
    fn test_connection_id_rejects_garbage() {
        // テスト項目: UUID でない文字列がエラーになる
        // given (前提条件):
        let garbage = "not-a-uuid";

        // when (操作):
        let result = ConnectionId::parse(garbage);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_display_name_trims_whitespace() {
        // テスト項目: 表示名の前後の空白が除去される
        // given (前提条件):
        let value = "  alice  ".to_string();

        // when (操作):
        let name = DisplayName::new(value).unwrap();

        // then (期待する結果):
        assert_eq!(name.as_str(), "alice");
    }

    #[test]
    fn test_display_name_rejects_whitespace_only() {
        // テスト項目: 空白のみの表示名が拒否される
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = DisplayName::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::Empty));
    }

    #[test]
    fn test_display_name_rejects_too_long() {
        // テスト項目: 64 文字を超える表示名が拒否される
        // given (前提条件):
        let value = "a".repeat(DisplayName::MAX_LEN + 1);

        // when (操作):
        let result = DisplayName::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::TooLong(DisplayName::MAX_LEN)));
    }

    #[test]
    fn test_display_name_factory_format() {
        // テスト項目: 既定表示名が `User` + 4 桁の形式になる
        // given (前提条件):

        // when (操作):
        for _ in 0..100 {
            let name = DisplayNameFactory::random();

            // then (期待する結果):
            let digits = name.as_str().strip_prefix("User").unwrap();
            let n: u16 = digits.parse().unwrap();
            assert!((1000..=9999).contains(&n));
        }
    }

    #[test]
    fn test_message_content_rejects_whitespace_only() {
        // テスト項目: 空白のみのメッセージ本文が拒否される
        // given (前提条件):
        let value = " \t\n ".to_string();

        // when (操作):
        let result = MessageContent::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::Empty));
    }

    #[test]
    fn test_message_content_trims_and_keeps_body() {
        // テスト項目: メッセージ本文が trim されて保持される
        // given (前提条件):
        let value = "  hello world  ".to_string();

        // when (操作):
        let content = MessageContent::new(value).unwrap();

        // then (期待する結果):
        assert_eq!(content.as_str(), "hello world");
    }
}
