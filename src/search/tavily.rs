use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::provider::{Document, SearchError, SearchProvider, Source};
use super::types::{TavilyErrorBody, TavilyRequest, TavilyResponse};
use crate::config::{ApiKey, TavilyConfig};

/// General-purpose web search via the Tavily API.
#[derive(Clone)]
pub struct TavilyClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
    timeout: Duration,
}

impl TavilyClient {
    pub fn new(http: Client, config: &TavilyConfig, timeout: Duration) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("tvly-test"),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl SearchProvider for TavilyClient {
    fn source(&self) -> Source {
        Source::General
    }

    async fn search(&self, query: &str, max_results: u8) -> Result<Vec<Document>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let request = TavilyRequest {
            query,
            max_results,
            search_depth: "basic",
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = classify_status(status.as_u16(), &text);
            warn!(error = %err, "Tavily API error");
            return Err(err);
        }

        let body: TavilyResponse = response.json().await.map_err(|e| SearchError::Malformed {
            provider: Source::General,
            message: e.to_string(),
        })?;
        debug!(hits = body.results.len(), "tavily search complete");

        Ok(body
            .results
            .into_iter()
            .filter(|hit| !hit.url.is_empty())
            .take(max_results as usize)
            .map(|hit| Document {
                title: hit.title,
                snippet: hit.content,
                identifier: hit.url,
                published: hit.published_date,
            })
            .collect())
    }
}

fn classify_status(status: u16, raw: &str) -> SearchError {
    let message = serde_json::from_str::<TavilyErrorBody>(raw)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.error)
        .unwrap_or_else(|| {
            let end = raw.floor_char_boundary(200);
            format!("HTTP {status}: {}", &raw[..end])
        });

    match status {
        429 => SearchError::RateLimited {
            provider: Source::General,
        },
        432 | 433 => SearchError::QuotaExhausted {
            provider: Source::General,
            message,
        },
        code => SearchError::Api {
            provider: Source::General,
            code,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_limit_is_quota_exhausted() {
        let body = r#"{"detail":{"error":"This request exceeds your plan's set usage limit."}}"#;
        match classify_status(432, body) {
            SearchError::QuotaExhausted { message, .. } => {
                assert!(message.contains("usage limit"));
            }
            other => panic!("expected QuotaExhausted, got: {other:?}"),
        }
    }

    #[test]
    fn unauthorized_is_api_error_with_detail() {
        let body = r#"{"detail":{"error":"Unauthorized: missing or invalid API key."}}"#;
        match classify_status(401, body) {
            SearchError::Api { code, message, .. } => {
                assert_eq!(code, 401);
                assert!(message.starts_with("Unauthorized"));
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_maps_hits_to_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer tvly-test"))
            .and(body_partial_json(serde_json::json!({
                "query": "flu symptoms",
                "max_results": 5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": "flu symptoms",
                "results": [
                    {
                        "title": "Flu Symptoms | CDC",
                        "url": "https://www.cdc.gov/flu/signs-symptoms/",
                        "content": "Fever, cough, sore throat.",
                        "score": 0.91
                    },
                    {
                        "title": "No URL",
                        "url": "",
                        "content": "dropped"
                    }
                ],
                "response_time": 0.8
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TavilyClient::with_base_url(Client::new(), &server.uri());
        let docs = client.search("flu symptoms", 5).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].identifier, "https://www.cdc.gov/flu/signs-symptoms/");
        assert_eq!(docs[0].snippet, "Fever, cough, sore throat.");
    }

    #[tokio::test]
    async fn search_429_returns_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = TavilyClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("flu", 5).await;
        assert!(matches!(result, Err(SearchError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn search_invalid_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = TavilyClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("flu", 5).await;
        assert!(matches!(result, Err(SearchError::Malformed { .. })));
    }
}
