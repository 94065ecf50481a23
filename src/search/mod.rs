//! Search backends and the dispatcher that picks one per classification.

pub(crate) mod dispatch;
pub(crate) mod provider;
pub(crate) mod pubmed;
pub(crate) mod tavily;
mod types;

pub use dispatch::{Dispatcher, SearchOutcome};
pub use provider::{Document, SearchError, SearchProvider, Source};
pub use pubmed::PubMedClient;
pub use tavily::TavilyClient;
