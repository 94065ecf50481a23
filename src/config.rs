use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-5-mini";
const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TAVILY_BASE: &str = "https://api.tavily.com";
const DEFAULT_PUBMED_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const DEFAULT_MAX_RESULTS: u8 = 5;
const DEFAULT_MAX_REFINEMENTS: u32 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// What the workflow does when results are still insufficient after the last
/// allowed refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustedPolicy {
    /// Summarize whatever the last search returned.
    #[default]
    Summarize,
    /// Abort the run with `AgentError::RefinementsExhausted`.
    Fail,
}

impl FromStr for ExhaustedPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summarize" => Ok(Self::Summarize),
            "fail" => Ok(Self::Fail),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: ApiKey,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct TavilyConfig {
    pub api_key: ApiKey,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct PubMedConfig {
    pub api_key: Option<ApiKey>,
    pub base_url: String,
}

/// Knobs of the classify → search → check → refine/summarize loop.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Result cap passed to both search providers.
    pub max_results: u8,
    /// Upper bound on Refine → Search cycles per run.
    pub max_refinements: u32,
    /// Re-run the classifier on the refined query instead of reusing the
    /// original label.
    pub reclassify_after_refine: bool,
    pub on_exhausted: ExhaustedPolicy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_refinements: DEFAULT_MAX_REFINEMENTS,
            reclassify_after_refine: false,
            on_exhausted: ExhaustedPolicy::default(),
        }
    }
}

/// Process-wide configuration, built once at startup and handed to each component.
///
/// Environment variables:
/// - `OPENAI_API_KEY` (required), `OPENAI_MODEL`, `OPENAI_BASE_URL`
/// - `TAVILY_API_KEY` (required), `TAVILY_BASE_URL`
/// - `NCBI_API_KEY`, `PUBMED_BASE_URL`
/// - `MEDROUTE_MAX_RESULTS`, `MEDROUTE_MAX_REFINEMENTS`, `MEDROUTE_RECLASSIFY`,
///   `MEDROUTE_ON_EXHAUSTED`, `MEDROUTE_TIMEOUT_SECS`
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub tavily: TavilyConfig,
    pub pubmed: PubMedConfig,
    pub workflow: WorkflowConfig,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let llm = LlmConfig {
            api_key: ApiKey(required("OPENAI_API_KEY")?),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE.to_string()),
        };
        let tavily = TavilyConfig {
            api_key: ApiKey(required("TAVILY_API_KEY")?),
            base_url: get("TAVILY_BASE_URL").unwrap_or_else(|| DEFAULT_TAVILY_BASE.to_string()),
        };
        let pubmed = PubMedConfig {
            api_key: get("NCBI_API_KEY").map(ApiKey),
            base_url: get("PUBMED_BASE_URL").unwrap_or_else(|| DEFAULT_PUBMED_BASE.to_string()),
        };

        let workflow = WorkflowConfig {
            max_results: parse_or(
                get("MEDROUTE_MAX_RESULTS"),
                "MEDROUTE_MAX_RESULTS",
                DEFAULT_MAX_RESULTS,
            )?,
            max_refinements: parse_or(
                get("MEDROUTE_MAX_REFINEMENTS"),
                "MEDROUTE_MAX_REFINEMENTS",
                DEFAULT_MAX_REFINEMENTS,
            )?,
            reclassify_after_refine: parse_flag(get("MEDROUTE_RECLASSIFY"), "MEDROUTE_RECLASSIFY")?,
            on_exhausted: parse_or(
                get("MEDROUTE_ON_EXHAUSTED"),
                "MEDROUTE_ON_EXHAUSTED",
                ExhaustedPolicy::default(),
            )?,
        };
        if workflow.max_results == 0 {
            return Err(ConfigError::Invalid {
                key: "MEDROUTE_MAX_RESULTS",
                value: "0".into(),
            });
        }

        let timeout_secs: u64 =
            parse_or(get("MEDROUTE_TIMEOUT_SECS"), "MEDROUTE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            llm,
            tavily,
            pubmed,
            workflow,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_flag(value: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    let lowered = value.as_deref().map(str::to_ascii_lowercase);
    match lowered.as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key,
            value: value.unwrap_or_default(),
        }),
    }
}
