use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::responses::{
        CreateResponseArgs, InputMessage, InputRole, OutputItem, OutputMessageContent,
    },
};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::secrets::{
    API_KEY_ENV, ApiKeySource, get_api_key_from_sources, prompt_for_api_key, store_api_key,
};
use super::{ModelError, TextModel};
use crate::config::Settings;
use crate::utils::preview;

const MAX_OUTPUT_TOKENS: u32 = 8000;

/// Remote model reached through an OpenAI-compatible Responses endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiModel {
    pub fn new(api_key: &str, settings: &Settings) -> Self {
        Self {
            client: initialize_client(api_key, settings.api_base.as_deref()),
            model: settings.model.clone(),
            timeout: settings.request_timeout,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    async fn respond(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ModelError> {
        let message = |role, text: &str| InputMessage {
            role,
            content: vec![text.into()],
            status: None,
        };
        let request = CreateResponseArgs::default()
            .model(self.model.as_str())
            .max_output_tokens(MAX_OUTPUT_TOKENS)
            .input(vec![
                message(InputRole::System, system_prompt),
                message(InputRole::User, user_prompt),
            ])
            .build()
            .map_err(|e| ModelError::Request(e.into()))?;

        let response = self
            .client
            .responses()
            .create(request)
            .await
            .map_err(|e| ModelError::Request(anyhow::Error::new(e).context("Responses API call failed")))?;

        first_output_text(response.output).ok_or(ModelError::EmptyReply)
    }
}

/// First non-blank text part of the first message that has one.
fn first_output_text(output: Vec<OutputItem>) -> Option<String> {
    output
        .into_iter()
        .filter_map(|item| match item {
            OutputItem::Message(message) => Some(message.content),
            _ => None,
        })
        .flatten()
        .find_map(|content| match content {
            OutputMessageContent::OutputText(text) if !text.text.trim().is_empty() => {
                Some(text.text.trim().to_string())
            }
            _ => None,
        })
}

impl TextModel for OpenAiModel {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ModelError> {
        debug!(
            model = %self.model,
            prompt = %preview(user_prompt, 100),
            "sending prompt"
        );
        let reply = tokio::time::timeout(self.timeout, self.respond(system_prompt, user_prompt))
            .await
            .map_err(|_| ModelError::Timeout(self.timeout.as_secs()))??;
        info!(model = %self.model, chars = reply.len(), "model replied");
        Ok(reply)
    }
}

/// An [`OpenAiModel`] built on first use.
///
/// Commands that never reach the model do not ask for an API key.
#[derive(Debug)]
pub struct LazyOpenAiModel {
    settings: Settings,
    model: OnceCell<OpenAiModel>,
}

impl LazyOpenAiModel {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            model: OnceCell::new(),
        }
    }
}

impl TextModel for LazyOpenAiModel {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ModelError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                ensure_model(&self.settings, "No API key is configured.")
            })
            .await
            .map_err(ModelError::Request)?;
        model.complete(system_prompt, user_prompt).await
    }
}

/// Builds a model, asking for an API key when none is configured.
pub fn ensure_model(settings: &Settings, user_prompt: &str) -> Result<OpenAiModel> {
    let auth_path = settings.auth_path();
    let lookup = get_api_key_from_sources(&auth_path)?;
    let key = match lookup.api_key {
        Some(api_key) => api_key,
        None => {
            let api_key = prompt_for_api_key(user_prompt)?;
            if api_key.is_empty() {
                bail!(
                    "No API key provided. Set {} or run `newsdrill llm --set <KEY>`.",
                    API_KEY_ENV
                );
            }
            store_api_key(&auth_path, &api_key)?;
            api_key
        }
    };

    Ok(OpenAiModel::new(&key, settings))
}

pub async fn test_configured_api_key(settings: &Settings) -> Result<ApiKeySource> {
    let lookup = get_api_key_from_sources(&settings.auth_path())?;
    let (Some(key), Some(source)) = (lookup.api_key, lookup.source) else {
        return Err(anyhow!(
            "Exercise generation is disabled. To enable, set {} or run `newsdrill llm --set <KEY>`.",
            API_KEY_ENV
        ));
    };
    let client = initialize_client(&key, settings.api_base.as_deref());
    healthcheck_client(&client).await?;
    Ok(source)
}

fn initialize_client(api_key: &str, api_base: Option<&str>) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }

    Client::with_config(config)
}

async fn healthcheck_client(client: &Client<OpenAIConfig>) -> Result<()> {
    client
        .models()
        .list()
        .await
        .context("Failed to validate API key against the model endpoint")?;
    Ok(())
}
