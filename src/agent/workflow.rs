use std::fmt;

use tracing::{info, warn};

use super::{AgentError, MemoryCheckpointer, RunState, classify, is_sufficient, refine, summarize};
use crate::config::{ExhaustedPolicy, WorkflowConfig};
use crate::llm::CompletionClient;
use crate::search::{Dispatcher, SearchProvider};

/// Nodes of the workflow graph.
///
/// ```text
/// Classify → Search → CheckQuality ─┬→ Summarize → Done
///              ↑                    │
///              └────── Refine ←─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Classify,
    Search,
    CheckQuality,
    Refine,
    Summarize,
    Done,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Classify => "classify",
            Step::Search => "search",
            Step::CheckQuality => "check_quality",
            Step::Refine => "refine",
            Step::Summarize => "summarize",
            Step::Done => "done",
        };
        f.write_str(name)
    }
}

/// Sequences classifier, dispatcher, quality gate, refiner and summarizer for one
/// question at a time. Holds no per-run state, so one `Agent` can serve
/// concurrent runs as long as they use distinct thread ids.
pub struct Agent<C, R, G> {
    llm: C,
    dispatcher: Dispatcher<R, G>,
    config: WorkflowConfig,
    checkpoints: MemoryCheckpointer,
}

impl<C, R, G> Agent<C, R, G>
where
    C: CompletionClient,
    R: SearchProvider,
    G: SearchProvider,
{
    pub fn new(llm: C, research: R, general: G, config: WorkflowConfig) -> Self {
        Self {
            llm,
            dispatcher: Dispatcher::new(research, general, config.max_results),
            config,
            checkpoints: MemoryCheckpointer::new(),
        }
    }

    pub fn checkpoints(&self) -> &MemoryCheckpointer {
        &self.checkpoints
    }

    /// Answers one question. `thread_id` only keys the checkpoint trail; a new
    /// run on the same thread replaces the previous trail.
    pub async fn run(&self, query: &str, thread_id: &str) -> Result<String, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::EmptyQuery);
        }

        info!(thread = %thread_id, query = %query, "run started");
        self.checkpoints.clear(thread_id);
        let state = self.execute(RunState::new(query), thread_id).await?;
        info!(
            thread = %thread_id,
            refinements = state.refinements,
            "run complete"
        );

        // `execute` only returns Ok after the summarize step filled `answer`.
        Ok(state.answer.unwrap_or_default())
    }

    /// Drives `state` from `Classify` to `Done`. Each step that completes is
    /// checkpointed with the state as it left that step; a failing step records
    /// nothing.
    pub async fn execute(
        &self,
        mut state: RunState,
        thread_id: &str,
    ) -> Result<RunState, AgentError> {
        let mut step = Step::Classify;
        loop {
            let next = match step {
                Step::Classify => {
                    let label = classify(&self.llm, &state.query)
                        .await
                        .map_err(AgentError::Classification)?;
                    state.classification = Some(label);
                    Step::Search
                }
                Step::Search => match state.classification {
                    None => Step::Classify,
                    Some(label) => {
                        let outcome = self
                            .dispatcher
                            .search(&state.query, label)
                            .await
                            .map_err(AgentError::Search)?;
                        state.results = outcome.results;
                        state.source = Some(outcome.source);
                        Step::CheckQuality
                    }
                },
                Step::CheckQuality => {
                    state.needs_refine = !is_sufficient(&state.results);
                    self.after_quality_check(&state)?
                }
                Step::Refine => {
                    state.query = refine(&self.llm, &state.query)
                        .await
                        .map_err(AgentError::Refinement)?;
                    state.refinements += 1;
                    if self.config.reclassify_after_refine {
                        Step::Classify
                    } else {
                        Step::Search
                    }
                }
                Step::Summarize => match state.source {
                    None => Step::Search,
                    Some(source) => {
                        let answer = summarize(&self.llm, &state.query, &state.results, source)
                            .await
                            .map_err(AgentError::Summarization)?;
                        state.answer = Some(answer);
                        Step::Done
                    }
                },
                Step::Done => return Ok(state),
            };
            self.checkpoints.save(thread_id, step, &state);
            step = next;
        }
    }

    fn after_quality_check(&self, state: &RunState) -> Result<Step, AgentError> {
        if !state.needs_refine {
            return Ok(Step::Summarize);
        }
        if state.refinements < self.config.max_refinements {
            return Ok(Step::Refine);
        }

        warn!(
            attempts = state.refinements,
            chars = state.results.chars().count(),
            "results still insufficient, refinement budget spent"
        );
        match self.config.on_exhausted {
            ExhaustedPolicy::Summarize => Ok(Step::Summarize),
            ExhaustedPolicy::Fail => Err(AgentError::RefinementsExhausted {
                attempts: state.refinements,
            }),
        }
    }
}
