pub mod client;
pub mod json;
pub mod secrets;

use thiserror::Error;

pub use client::{LazyOpenAiModel, OpenAiModel, ensure_model, test_configured_api_key};
pub use json::extract_json;
pub use secrets::{clear_api_key, store_api_key};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0:#}")]
    Request(anyhow::Error),

    #[error("model request timed out after {0} seconds")]
    Timeout(u64),

    #[error("model returned no text")]
    EmptyReply,

    #[error("cannot find the closing ``` of the json block")]
    UnclosedFence,

    #[error("model reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A language model that turns a prompt into text.
#[allow(async_fn_in_trait)]
pub trait TextModel {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ModelError>;
}
