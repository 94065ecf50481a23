use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct TavilyRequest<'a> {
    pub query: &'a str,
    pub max_results: u8,
    pub search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TavilyResponse {
    #[serde(default)]
    pub results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
pub struct TavilyHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    pub published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TavilyErrorBody {
    pub detail: Option<TavilyErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct TavilyErrorDetail {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ESearchResponse {
    pub esearchresult: Option<ESearchResult>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ESearchResult {
    #[serde(default)]
    pub idlist: Vec<String>,
    #[serde(rename = "ERROR")]
    pub error: Option<String>,
}

/// `esummary` keys each record by its PMID next to a `uids` list,
/// so the body is kept as a raw map and records are decoded one at a time.
#[derive(Debug, Deserialize)]
pub struct ESummaryResponse {
    pub result: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryRecord {
    #[serde(default)]
    pub title: String,
    pub pubdate: Option<String>,
    pub fulljournalname: Option<String>,
}
