//! The classify → search → check → refine/summarize workflow and its stages.

mod checkpoint;
mod classify;
mod quality;
mod refine;
mod summarize;
mod workflow;

pub use checkpoint::{Checkpoint, DEFAULT_MAX_THREADS, MemoryCheckpointer};
pub use classify::classify;
pub use quality::{MIN_RESULT_CHARS, is_sufficient};
pub use refine::refine;
pub use summarize::{DISCLAIMER, summarize};
pub use workflow::{Agent, Step};

use crate::llm::CompletionError;
use crate::search::{SearchError, Source};

/// Which kind of backend a question should be answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Studies, evidence, molecules, clinical trials.
    Research,
    /// Symptoms, treatment options, patient-facing information.
    General,
}

/// Mutable record threaded through every stage of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    /// Current search query; replaced on refinement.
    pub query: String,
    pub classification: Option<Classification>,
    /// Backend that produced `results`.
    pub source: Option<Source>,
    pub results: String,
    pub needs_refine: bool,
    /// Refine → Search cycles taken so far.
    pub refinements: u32,
    pub answer: Option<String>,
}

impl RunState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Every collaborator failure is fatal to the run; no partial answer is returned.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("classification failed: {0}")]
    Classification(#[source] CompletionError),

    #[error("search failed: {0}")]
    Search(#[source] SearchError),

    #[error("query refinement failed: {0}")]
    Refinement(#[source] CompletionError),

    #[error("summarization failed: {0}")]
    Summarization(#[source] CompletionError),

    #[error("results still insufficient after {attempts} refinements")]
    RefinementsExhausted { attempts: u32 },

    #[error("query must not be empty")]
    EmptyQuery,
}
