//! Search Client — Tavily-backed web search with AI-summarized answers.
//!
//! Company research quality depends on the summarized `answer` field, so
//! `search_with_answer` keeps trying (bounded) until it gets a non-empty one.

use std::future::Future;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";
const SEARCH_DEPTH: &str = "advanced";
const MAX_RESULTS: u32 = 5;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(1);
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
    api_key: &'a str,
    include_answer: bool,
}

/// One web hit from the search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// A search result with the optional AI-summarized answer the research
/// facets feed on. `answer` empty or absent means the summary was unusable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub answer: String,
}

impl SearchResult {
    pub fn has_answer(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// The search seam consumed by company research.
///
/// The API key is an argument rather than construction state so that a
/// missing credential is the caller's configuration concern, checked before
/// any search is attempted.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Searches with retry: up to 3 attempts with a ~1s pause between them,
    /// returning early on the first result carrying a non-empty answer.
    /// After exhaustion the final attempt decides the outcome: its error,
    /// or its answer-less result.
    async fn search_with_answer(
        &self,
        api_key: &str,
        query: &str,
    ) -> Result<SearchResult, SearchError>;
}

#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
}

impl TavilyClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn do_search(&self, api_key: &str, query: &str) -> Result<SearchResult, SearchError> {
        let request_body = TavilySearchRequest {
            query,
            search_depth: SEARCH_DEPTH,
            max_results: MAX_RESULTS,
            api_key,
            include_answer: true,
        };

        let response = self
            .client
            .post(TAVILY_API_URL)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }
}

impl Default for TavilyClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The retry ladder behind `search_with_answer`: runs `do_attempt` up to
/// `MAX_ATTEMPTS` times with `RETRY_DELAY` between attempts, returning
/// early on the first result carrying a non-empty answer. After exhaustion
/// the final attempt decides the outcome.
async fn search_with_retry<F, Fut>(
    query: &str,
    mut do_attempt: F,
) -> Result<SearchResult, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SearchResult, SearchError>>,
{
    let mut last_result = SearchResult::default();
    let mut last_error: Option<SearchError> = None;

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            warn!(
                "Retrying search for \"{}\" (attempt {}/{})",
                query,
                attempt + 1,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(RETRY_DELAY).await;
        }

        match do_attempt().await {
            Ok(result) => {
                if result.has_answer() {
                    return Ok(result);
                }
                last_result = result;
                last_error = None;
            }
            Err(e) => {
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(last_result),
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search_with_answer(
        &self,
        api_key: &str,
        query: &str,
    ) -> Result<SearchResult, SearchError> {
        search_with_retry(query, || self.do_search(api_key, query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    fn answered(answer: &str) -> SearchResult {
        SearchResult {
            results: vec![],
            answer: answer.to_string(),
        }
    }

    fn hit(title: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: "https://example.co.jp/recruit".to_string(),
            content: String::new(),
        }
    }

    #[test]
    fn test_search_result_answer_detection() {
        let with = SearchResult {
            results: vec![],
            answer: "社員の挑戦を重視する社風です。".to_string(),
        };
        let without = SearchResult {
            results: vec![],
            answer: "   ".to_string(),
        };
        assert!(with.has_answer());
        assert!(!without.has_answer());
    }

    #[test]
    fn test_search_result_deserializes_without_answer_field() {
        let result: SearchResult = serde_json::from_str(
            r#"{"results": [{"title": "採用情報", "url": "https://example.co.jp/recruit", "content": "新卒採用ページ"}]}"#,
        )
        .unwrap();
        assert_eq!(result.results.len(), 1);
        assert!(!result.has_answer());
    }

    #[test]
    fn test_request_body_carries_fixed_search_parameters() {
        let body = TavilySearchRequest {
            query: "株式会社エグザンプル 企業理念",
            search_depth: SEARCH_DEPTH,
            max_results: MAX_RESULTS,
            api_key: "tvly-test",
            include_answer: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["search_depth"], "advanced");
        assert_eq!(json["max_results"], 5);
        assert_eq!(json["include_answer"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_the_first_answered_attempt() {
        let calls = AtomicU32::new(0);

        let result = search_with_retry("株式会社サンプル 企業理念", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(answered("一回目の要約")) }
        })
        .await
        .unwrap();

        assert_eq!(result.answer, "一回目の要約");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_a_failed_attempt() {
        let calls = AtomicU32::new(0);

        let result = search_with_retry("株式会社サンプル 企業理念", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt == 1 {
                    Err(SearchError::Api {
                        status: 500,
                        message: "upstream failure".to_string(),
                    })
                } else {
                    Ok(answered("二回目の要約"))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result.answer, "二回目の要約");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_empty_answers_to_the_last_result() {
        let calls = AtomicU32::new(0);

        let result = search_with_retry("株式会社サンプル 企業理念", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                Ok(SearchResult {
                    results: vec![hit(&format!("{attempt}件目"))],
                    answer: String::new(),
                })
            }
        })
        .await
        .unwrap();

        assert!(!result.has_answer());
        assert_eq!(result.results[0].title, "3件目");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_errors_to_the_last_error() {
        let calls = AtomicU32::new(0);

        let err = search_with_retry("株式会社サンプル 企業理念", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                Err(SearchError::Api {
                    status: 500 + attempt as u16,
                    message: "upstream failure".to_string(),
                })
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, SearchError::Api { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
