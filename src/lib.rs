//! Medical question router: classifies a question as research or general,
//! searches PubMed or Tavily accordingly, refines the query while results are
//! thin, and returns a cited summary.

pub mod agent;
pub mod config;
pub mod llm;
pub mod search;

#[cfg(test)]
mod testing;

use std::time::Duration;

use reqwest::Client;

use agent::{Agent, AgentError};
use config::Config;
use llm::OpenAiClient;
use search::{PubMedClient, TavilyClient};

pub const USER_AGENT: &str = concat!("medroute/", env!("CARGO_PKG_VERSION"));

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

/// The production wiring: OpenAI-compatible completions, PubMed, Tavily.
pub type MedicalAgent = Agent<OpenAiClient, PubMedClient, TavilyClient>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

pub fn build_agent(config: &Config) -> Result<MedicalAgent, reqwest::Error> {
    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(config.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;

    Ok(Agent::new(
        OpenAiClient::new(http.clone(), &config.llm, config.request_timeout),
        PubMedClient::new(http.clone(), &config.pubmed, config.request_timeout),
        TavilyClient::new(http, &config.tavily, config.request_timeout),
        config.workflow.clone(),
    ))
}

/// One-shot entry point: builds the clients and answers a single question.
pub async fn run_agent(config: &Config, user_query: &str) -> Result<String, Error> {
    let agent = build_agent(config)?;
    Ok(agent.run(user_query, "default").await?)
}
