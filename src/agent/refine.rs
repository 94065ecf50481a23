use tracing::info;

use crate::llm::{CompletionClient, CompletionError};

fn prompt(query: &str) -> String {
    format!(
        r#"The previous search for "{query}" returned limited results.
Suggest a more specific or alternative query that could yield better results.
Reply with the query text only."#
    )
}

/// Asks the model for a replacement query. The reply is trusted as-is apart from
/// trimming; nothing checks that it stays on topic. A blank reply is
/// [`CompletionError::EmptyCompletion`].
pub async fn refine(llm: &impl CompletionClient, query: &str) -> Result<String, CompletionError> {
    let reply = llm.complete(&prompt(query)).await?;
    let refined = reply.trim().to_string();
    if refined.is_empty() {
        return Err(CompletionError::EmptyCompletion);
    }
    info!(from = %query, to = %refined, "refining query");
    Ok(refined)
}
