use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use super::provider::{Document, SearchError, SearchProvider, Source};
use super::types::{ESearchResponse, ESummaryResponse, SummaryRecord};
use crate::config::{ApiKey, PubMedConfig};

/// Scholarly search via NCBI E-utilities.
///
/// A search costs `2 + n` requests: `esearch` for PMIDs, one batched `esummary`
/// for titles and dates, then one `efetch` per PMID for the abstract text.
/// Requests are spaced to stay under the E-utilities limit (3 req/sec without
/// an API key, 10 with one); clones share the same pacing.
#[derive(Clone)]
pub struct PubMedClient {
    http: Client,
    api_key: Option<ApiKey>,
    base_url: String,
    timeout: Duration,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

const KEYLESS_INTERVAL: Duration = Duration::from_millis(340);
const KEYED_INTERVAL: Duration = Duration::from_millis(110);

impl PubMedClient {
    pub fn new(http: Client, config: &PubMedConfig, timeout: Duration) -> Self {
        let min_interval = if config.api_key.is_some() {
            KEYED_INTERVAL
        } else {
            debug!("No NCBI_API_KEY set. E-utilities limit: 3 req/sec.");
            KEYLESS_INTERVAL
        };
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self::with_interval(http, base_url, Duration::ZERO)
    }

    #[cfg(test)]
    pub(crate) fn with_interval(http: Client, base_url: &str, min_interval: Duration) -> Self {
        Self {
            http,
            api_key: None,
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits until `min_interval` has passed since the previous request.
    /// The lock is held across the sleep so concurrent callers queue up.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let wait = self.min_interval.saturating_sub(prev.elapsed());
            if !wait.is_zero() {
                debug!(wait_ms = wait.as_millis() as u64, "pacing PubMed request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn endpoint(&self, name: &str, params: &[(&str, &str)]) -> Result<Url, SearchError> {
        let mut url = Url::parse_with_params(&format!("{}/{name}", self.base_url), params)?;
        url.query_pairs_mut().append_pair("db", "pubmed");
        if let Some(ref key) = self.api_key {
            url.query_pairs_mut().append_pair("api_key", key.expose());
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response, SearchError> {
        self.pace().await;
        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(response),
            429 => {
                warn!("PubMed rate limited");
                Err(SearchError::RateLimited {
                    provider: Source::Research,
                })
            }
            code => {
                let text = response.text().await.unwrap_or_default();
                let end = text.floor_char_boundary(200);
                warn!(status = %status, "PubMed API error");
                Err(SearchError::Api {
                    provider: Source::Research,
                    code,
                    message: format!("HTTP {status}: {}", &text[..end]),
                })
            }
        }
    }

    async fn search_ids(&self, query: &str, max_results: u8) -> Result<Vec<String>, SearchError> {
        let retmax = max_results.to_string();
        let url = self.endpoint(
            "esearch.fcgi",
            &[
                ("term", query),
                ("retmode", "json"),
                ("retmax", retmax.as_str()),
                ("sort", "relevance"),
            ],
        )?;
        let body: ESearchResponse = self.get(url).await?.json().await.map_err(malformed)?;

        if let Some(message) = body.error {
            return Err(api_error(message));
        }
        let result = body
            .esearchresult
            .ok_or_else(|| malformed_msg("esearch response without esearchresult"))?;
        if let Some(message) = result.error {
            return Err(api_error(message));
        }
        Ok(result.idlist)
    }

    async fn summaries(&self, ids: &[String]) -> Result<Vec<SummaryRecord>, SearchError> {
        let joined = ids.join(",");
        let url = self.endpoint(
            "esummary.fcgi",
            &[("id", joined.as_str()), ("retmode", "json")],
        )?;
        let body: ESummaryResponse = self.get(url).await?.json().await.map_err(malformed)?;
        let result = body
            .result
            .ok_or_else(|| malformed_msg("esummary response without result"))?;

        Ok(ids
            .iter()
            .map(|id| {
                result
                    .get(id)
                    .cloned()
                    .and_then(|record| serde_json::from_value(record).ok())
                    .unwrap_or_else(|| {
                        warn!(pmid = %id, "missing esummary record");
                        SummaryRecord::default()
                    })
            })
            .collect())
    }

    async fn abstract_text(&self, id: &str) -> Result<String, SearchError> {
        let url = self.endpoint(
            "efetch.fcgi",
            &[("id", id), ("rettype", "abstract"), ("retmode", "text")],
        )?;
        let text = self.get(url).await?.text().await?;
        Ok(text.trim().to_string())
    }
}

impl SearchProvider for PubMedClient {
    fn source(&self) -> Source {
        Source::Research
    }

    async fn search(&self, query: &str, max_results: u8) -> Result<Vec<Document>, SearchError> {
        let mut ids = self.search_ids(query, max_results).await?;
        ids.truncate(max_results as usize);
        if ids.is_empty() {
            debug!("pubmed search returned no ids");
            return Ok(Vec::new());
        }

        let summaries = self.summaries(&ids).await?;

        let mut documents = Vec::with_capacity(ids.len());
        for (id, summary) in ids.into_iter().zip(summaries) {
            let snippet = self.abstract_text(&id).await?;
            let published = match (summary.pubdate, summary.fulljournalname) {
                (Some(date), Some(journal)) if !journal.is_empty() => {
                    Some(format!("{date}, {journal}"))
                }
                (date, _) => date,
            };
            documents.push(Document {
                title: summary.title,
                snippet,
                identifier: id,
                published,
            });
        }

        debug!(records = documents.len(), "pubmed search complete");
        Ok(documents)
    }
}

fn malformed(e: reqwest::Error) -> SearchError {
    malformed_msg(&e.to_string())
}

fn malformed_msg(message: &str) -> SearchError {
    SearchError::Malformed {
        provider: Source::Research,
        message: message.to_string(),
    }
}

fn api_error(message: String) -> SearchError {
    SearchError::Api {
        provider: Source::Research,
        code: 200,
        message,
    }
}
