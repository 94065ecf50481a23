//! Text-completion client for an OpenAI-compatible chat endpoint.

pub(crate) mod client;
mod types;

pub use client::{CompletionClient, CompletionError, OpenAiClient};
