//! 動画検索プロキシ
//!
//! YouTube Data API v3 の search エンドポイントへのステートレスな
//! パススルー。API キーをサーバー側に秘匿するためだけに存在し、
//! レスポンスは加工せずそのまま返す。

use serde_json::Value;
use thiserror::Error;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";

/// 検索結果件数の上限（YouTube API 側の制限に合わせる）
const MAX_RESULTS_CAP: u32 = 50;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// YouTube 検索クライアント
pub struct YouTubeSearchClient {
    http: reqwest::Client,
    api_key: String,
}

impl YouTubeSearchClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    /// 動画を検索し、API のレスポンス JSON をそのまま返す
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Value, SearchError> {
        let max_results = max_results.min(MAX_RESULTS_CAP).max(1);

        let response = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", &max_results.to_string()),
                ("q", query),
                ("key", &self.api_key),
            ])
            .send()
            .await?;

        let body = response.json::<Value>().await?;
        Ok(body)
    }
}
