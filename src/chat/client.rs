//! Chat-completion client for an OpenRouter-compatible endpoint.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{ApiError, HttpClient};

pub const DEFAULT_CHAT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_REFERER: &str = "https://hostit.app";
pub const APP_TITLE: &str = "HostIT Assistant";

pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant for the HostIT platform, a service that helps users deploy their applications through GitHub integration. \
ONLY answer questions related to the HostIT platform features, deployment processes, GitHub integration, and website functionality. \
If users ask questions unrelated to the website or platform, politely redirect them to website-related topics. \
Be concise, professional, and helpful. The HostIT platform offers features like GitHub integration, one-click deployments, custom domains, and AI assistance.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No chat API key configured. Set OPENROUTER_API_KEY.")]
    MissingApiKey,

    #[error("Invalid request header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Completion response contained no choices")]
    EmptyResponse,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompletionRole {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompletionMessage {
    pub role: CompletionRole,
    pub content: String,
}

impl CompletionMessage {
    pub fn new(role: CompletionRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [CompletionMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Returns the assistant's reply to `messages`.
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String, ChatError>;
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub api_url: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub referer: String,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_CHAT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            referer: DEFAULT_REFERER.to_string(),
        }
    }
}

pub struct OpenRouterClient {
    http: HttpClient,
    api_key: Option<String>,
    options: ChatOptions,
}

impl OpenRouterClient {
    pub fn new(http: HttpClient, api_key: Option<String>, options: ChatOptions) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            options,
        }
    }

    /// Prepends the system prompt unless the conversation already has one.
    fn with_system_prompt(&self, messages: &[CompletionMessage]) -> Vec<CompletionMessage> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        if !self.options.system_prompt.is_empty()
            && messages.iter().all(|m| m.role != CompletionRole::System)
        {
            out.push(CompletionMessage::new(
                CompletionRole::System,
                self.options.system_prompt.clone(),
            ));
        }
        out.extend_from_slice(messages);
        out
    }
}

#[async_trait]
impl CompletionApi for OpenRouterClient {
    #[tracing::instrument(skip(self, messages), fields(count = messages.len()))]
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingApiKey)?;

        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert("http-referer", HeaderValue::from_str(&self.options.referer)?);
        headers.insert("x-title", HeaderValue::from_static(APP_TITLE));

        let messages = self.with_system_prompt(messages);
        let request = CompletionRequest {
            model: &self.options.model,
            messages: &messages,
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        debug!(
            "Requesting completion from {} with model {}",
            self.options.api_url, self.options.model
        );

        let response: CompletionResponse = self
            .http
            .post_json_with_headers(&self.options.api_url, headers, &request)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ChatError::EmptyResponse)
    }
}
