use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::cli::chat::prompt_chain::ChatMessage;
use crate::config::endpoint;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not reach the model server at {url}. Is Ollama running?")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Model server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Request to model server failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Unexpected response from model server: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ClientError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Unreachable { .. })
    }
}

/// Something that can turn a prompt chain into a reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(
        &self,
        model: &str,
        temperature: f32,
        messages: &[ChatMessage],
    ) -> Result<String, ClientError>;

    async fn list_models(&self) -> Result<Vec<String>, ClientError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    eval_count: usize,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

pub struct OllamaClient {
    host: Url,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(host: Url) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("code-companion/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self { host, client })
    }

    fn send_error(&self, url: &Url, e: reqwest::Error) -> ClientError {
        error!("Model server request to {} failed: {}", url, e);
        if e.is_connect() || e.is_timeout() {
            ClientError::Unreachable {
                url: self.host.to_string(),
                source: e,
            }
        } else {
            ClientError::Request(e)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Model server returned error {}: {}", status, body);
        Err(ClientError::Status { status, body })
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        temperature: f32,
        messages: &[ChatMessage],
    ) -> Result<String, ClientError> {
        let url = endpoint(&self.host, "api/chat");

        let request_body = ChatRequest {
            model,
            messages,
            stream: false,
            options: ChatOptions { temperature },
        };

        debug!(
            "Sending chat request to {}: model={}, {} messages",
            url,
            model,
            messages.len()
        );

        let response = self
            .client
            .post(url.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.send_error(&url, e))?;

        let response = Self::check_status(response).await?;
        let chat: ChatResponse = response.json().await.map_err(ClientError::Decode)?;

        debug!(
            "Received reply: done={}, eval_count={}, {} chars",
            chat.done,
            chat.eval_count,
            chat.message.content.len()
        );

        Ok(chat.message.content)
    }

    async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        let url = endpoint(&self.host, "api/tags");
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.send_error(&url, e))?;

        let response = Self::check_status(response).await?;
        let tags: TagsResponse = response.json().await.map_err(ClientError::Decode)?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
