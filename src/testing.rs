//! Scripted in-process collaborators shared by workflow tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::{CompletionClient, CompletionError};
use crate::search::{Document, SearchError, SearchProvider, Source};

type Responder = Box<dyn Fn(&str) -> Result<String, CompletionError> + Send + Sync>;

pub(crate) struct MockLlm {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    pub(crate) fn new(
        responder: impl Fn(&str) -> Result<String, CompletionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Deterministic stand-in for the model: labels trial/evidence/molecule/study
    /// questions as research, narrows refined queries, and cites the first
    /// identifier it sees when summarizing.
    pub(crate) fn medical() -> Self {
        Self::new(|prompt| Ok(medical_reply(prompt)))
    }

    /// Behaves like `medical()` except that prompts containing `marker` fail.
    pub(crate) fn failing_on(marker: &'static str) -> Self {
        Self::new(move |prompt| {
            if prompt.contains(marker) {
                Err(CompletionError::Api {
                    code: 503,
                    message: "model overloaded".into(),
                })
            } else {
                Ok(medical_reply(prompt))
            }
        })
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn calls_containing(&self, marker: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(marker))
            .count()
    }
}

impl CompletionClient for MockLlm {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

fn quoted(prompt: &str) -> &str {
    prompt.split('"').nth(1).unwrap_or_default()
}

fn medical_reply(prompt: &str) -> String {
    if prompt.contains("Classify this query") {
        let query = quoted(prompt).to_lowercase();
        let research = ["trial", "evidence", "molecule", "study", "studies"]
            .iter()
            .any(|w| query.contains(w));
        let label = if research { "research" } else { "general" };
        return label.to_string();
    }
    if prompt.contains("returned limited results") {
        return format!("{} clinical guidelines", quoted(prompt));
    }
    if prompt.contains("Summarize the following search results") {
        let citation = prompt
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("PMID: ") || l.starts_with("URL: "))
            .unwrap_or("no sources");
        return format!(
            "Findings for \"{}\" [{citation}].\n\nDisclaimer: This is not professional medical advice.",
            quoted(prompt)
        );
    }
    "unrecognized prompt".to_string()
}

pub(crate) struct MockProvider {
    source: Source,
    scripted: Mutex<VecDeque<Vec<Document>>>,
    fallback: Option<Vec<Document>>,
    queries: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(source: Source, scripted: Vec<Vec<Document>>, fallback: Option<Vec<Document>>) -> Self {
        Self {
            source,
            scripted: Mutex::new(scripted.into()),
            fallback,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn research_records(n: usize) -> Self {
        Self::always(Source::Research, research_docs(n))
    }

    pub(crate) fn web_documents(n: usize) -> Self {
        Self::always(Source::General, web_docs(n))
    }

    pub(crate) fn always(source: Source, docs: Vec<Document>) -> Self {
        Self::new(source, Vec::new(), Some(docs))
    }

    /// Returns `first` on the first call and `rest` on every later call.
    pub(crate) fn first_then(source: Source, first: Vec<Document>, rest: Vec<Document>) -> Self {
        Self::new(source, vec![first], Some(rest))
    }

    pub(crate) fn failing(source: Source) -> Self {
        Self::new(source, Vec::new(), None)
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl SearchProvider for MockProvider {
    fn source(&self) -> Source {
        self.source
    }

    async fn search(&self, query: &str, max_results: u8) -> Result<Vec<Document>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        let next = self.scripted.lock().unwrap().pop_front();
        let mut docs = match next.or_else(|| self.fallback.clone()) {
            Some(docs) => docs,
            None => {
                return Err(SearchError::RateLimited {
                    provider: self.source,
                });
            }
        };
        docs.truncate(max_results as usize);
        Ok(docs)
    }
}

pub(crate) fn research_docs(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| Document {
            title: format!("GLP-1 receptor agonists and weight reduction, trial {i}"),
            snippet: "In this randomized, double-blind trial, adults with obesity receiving \
                      once-weekly semaglutide lost significantly more weight than placebo."
                .into(),
            identifier: format!("3356718{i}"),
            published: Some("2021 Mar 18".into()),
        })
        .collect()
}

pub(crate) fn web_docs(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| Document {
            title: format!("Flu symptoms overview {i}"),
            snippet: "Influenza commonly causes fever, cough, sore throat, muscle aches, \
                      fatigue and headaches."
                .into(),
            identifier: format!("https://www.cdc.gov/flu/symptoms-{i}"),
            published: None,
        })
        .collect()
}

/// A single hit whose rendered blob stays under the quality threshold.
pub(crate) fn tiny_doc(source: Source) -> Vec<Document> {
    vec![Document {
        title: "x".into(),
        snippet: "y".into(),
        identifier: match source {
            Source::Research => "1".into(),
            Source::General => "https://a.io".into(),
        },
        published: None,
    }]
}
