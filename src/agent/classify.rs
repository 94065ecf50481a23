use tracing::debug;

use super::Classification;
use crate::llm::{CompletionClient, CompletionError};

fn prompt(query: &str) -> String {
    format!(
        r#"You are deciding how to search for medical information.

Classify this query:
"{query}"

Output exactly one label:
- 'research' if it asks about studies, evidence, molecules, or clinical trials.
- 'general' if it asks about treatment options, symptoms, or patient-friendly info."#
    )
}

/// Asks the model for a label. Any reply containing "research" counts as research,
/// even a sentence like "no research needed".
pub async fn classify(
    llm: &impl CompletionClient,
    query: &str,
) -> Result<Classification, CompletionError> {
    let reply = llm.complete(&prompt(query)).await?;
    let classification = parse_label(&reply);
    debug!(reply = %reply, ?classification, "query classified");
    Ok(classification)
}

fn parse_label(reply: &str) -> Classification {
    if reply.trim().to_lowercase().contains("research") {
        Classification::Research
    } else {
        Classification::General
    }
}
