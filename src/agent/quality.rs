/// Result blobs shorter than this many characters trigger a refinement.
pub const MIN_RESULT_CHARS: usize = 100;

/// Length-only proxy for "did the search return anything useful".
/// Says nothing about relevance: any 100-character blob passes.
pub fn is_sufficient(results: &str) -> bool {
    results.chars().count() >= MIN_RESULT_CHARS
}
