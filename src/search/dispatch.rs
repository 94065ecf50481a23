use tracing::info;

use super::provider::{SearchError, SearchProvider, Source, render_documents};
use crate::agent::Classification;

/// Result blob plus the backend that produced it; the two always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: String,
    pub source: Source,
    pub hits: usize,
}

/// Routes a classified query to the research or the general provider.
pub struct Dispatcher<R, G> {
    research: R,
    general: G,
    max_results: u8,
}

impl<R: SearchProvider, G: SearchProvider> Dispatcher<R, G> {
    pub fn new(research: R, general: G, max_results: u8) -> Self {
        Self {
            research,
            general,
            max_results,
        }
    }

    #[cfg(test)]
    pub(crate) fn research(&self) -> &R {
        &self.research
    }

    #[cfg(test)]
    pub(crate) fn general(&self) -> &G {
        &self.general
    }

    pub async fn search(
        &self,
        query: &str,
        classification: Classification,
    ) -> Result<SearchOutcome, SearchError> {
        match classification {
            Classification::Research => {
                info!(provider = %self.research.source(), "using scholarly search");
                self.run(&self.research, query).await
            }
            Classification::General => {
                info!(provider = %self.general.source(), "using general medical search");
                self.run(&self.general, query).await
            }
        }
    }

    async fn run(
        &self,
        provider: &impl SearchProvider,
        query: &str,
    ) -> Result<SearchOutcome, SearchError> {
        let source = provider.source();
        let documents = provider.search(query, self.max_results).await?;
        Ok(SearchOutcome {
            results: render_documents(source, &documents),
            source,
            hits: documents.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;

    #[tokio::test]
    async fn research_label_goes_to_research_provider() {
        let dispatcher = Dispatcher::new(
            MockProvider::research_records(2),
            MockProvider::web_documents(3),
            5,
        );

        let outcome = dispatcher
            .search("semaglutide trial", Classification::Research)
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Research);
        assert_eq!(outcome.hits, 2);
        assert!(outcome.results.contains("PMID: "));
        assert_eq!(dispatcher.research.queries(), vec!["semaglutide trial"]);
        assert!(dispatcher.general.queries().is_empty());
    }

    #[tokio::test]
    async fn general_label_goes_to_general_provider() {
        let dispatcher = Dispatcher::new(
            MockProvider::research_records(2),
            MockProvider::web_documents(3),
            5,
        );

        let outcome = dispatcher
            .search("flu symptoms", Classification::General)
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::General);
        assert!(outcome.results.contains("URL: https://"));
        assert!(dispatcher.research.queries().is_empty());
    }

    #[tokio::test]
    async fn result_cap_is_passed_to_provider() {
        let dispatcher = Dispatcher::new(
            MockProvider::research_records(10),
            MockProvider::web_documents(10),
            5,
        );

        let outcome = dispatcher.search("q", Classification::General).await.unwrap();
        assert_eq!(outcome.hits, 5);
    }

    #[tokio::test]
    async fn provider_error_is_not_retried_elsewhere() {
        let dispatcher = Dispatcher::new(
            MockProvider::failing(Source::Research),
            MockProvider::web_documents(3),
            5,
        );

        let result = dispatcher.search("q", Classification::Research).await;

        assert!(matches!(result, Err(SearchError::RateLimited { .. })));
        assert!(dispatcher.general.queries().is_empty());
    }
}
