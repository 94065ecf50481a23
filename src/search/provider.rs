use std::fmt;

/// Which backend produced a result blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Scholarly index (PubMed).
    Research,
    /// General web search (Tavily).
    General,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Research => f.write_str("PubMed"),
            Source::General => f.write_str("Tavily"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{provider} rate limit exceeded")]
    RateLimited { provider: Source },

    #[error("{provider} quota exhausted: {message}")]
    QuotaExhausted { provider: Source, message: String },

    #[error("{provider} API error ({code}): {message}")]
    Api {
        provider: Source,
        code: u16,
        message: String,
    },

    #[error("{provider} returned a malformed response: {message}")]
    Malformed { provider: Source, message: String },

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One search hit, normalized across providers.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    /// Abstract for scholarly records, content snippet for web documents.
    pub snippet: String,
    /// PMID or URL.
    pub identifier: String,
    pub published: Option<String>,
}

/// A search backend: free-text query in, ordered document list out.
/// Implemented by `PubMedClient` and `TavilyClient`; mock implementations used in tests.
pub trait SearchProvider {
    fn source(&self) -> Source;

    async fn search(&self, query: &str, max_results: u8) -> Result<Vec<Document>, SearchError>;
}

/// Flattens documents into the text blob handed to the quality gate and summarizer.
/// An empty list renders as the empty string.
pub fn render_documents(source: Source, documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| render_document(source, doc))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_document(source: Source, doc: &Document) -> String {
    match source {
        Source::Research => {
            let mut out = format!("PMID: {}\n", doc.identifier);
            if let Some(date) = &doc.published {
                out.push_str(&format!("Published: {date}\n"));
            }
            out.push_str(&format!("Title: {}\nSummary:\n{}", doc.title, doc.snippet));
            out
        }
        Source::General => format!(
            "Title: {}\nURL: {}\nContent: {}",
            doc.title, doc.identifier, doc.snippet
        ),
    }
}
