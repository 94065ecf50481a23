use crate::llm::{CompletionClient, CompletionError};
use crate::search::Source;

/// Phrase the summarizer is told to include. Its presence in the answer is up to
/// the model and is not checked.
pub const DISCLAIMER: &str = "This is not professional medical advice.";

fn prompt(query: &str, results: &str, source: Source) -> String {
    let citation = match source {
        Source::Research => "PMID",
        Source::General => "URL",
    };
    format!(
        r#"You are a medical information assistant.

Summarize the following search results for the query:
"{query}"

Use a professional, factual tone and include inline citations ({citation} for each claim).
Always end with the disclaimer: "{DISCLAIMER}"

Results ({source}):
{results}"#
    )
}

pub async fn summarize(
    llm: &impl CompletionClient,
    query: &str,
    results: &str,
    source: Source,
) -> Result<String, CompletionError> {
    let reply = llm.complete(&prompt(query, results, source)).await?;
    Ok(reply.trim().to_string())
}
