//! HTTP client shared by the model and its sessions.

use std::time::Duration;

use tracing::debug;

use pagemind_config::ModelConfig;
use pagemind_protocols::ModelError;

use crate::api::{ApiMessage, ChatRequest, ChatResponse, ErrorBody, ModelList};

pub(crate) struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f32>,
    timeout_secs: u64,
}

impl Client {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ModelError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// IDs of the models the server offers.
    pub async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let request = self.authorize(self.http.get(format!("{}/models", self.base_url)));
        let response = self.send(request).await?;
        let list: ModelList = response
            .json()
            .await
            .map_err(|e| ModelError::Invocation(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    /// Run one chat completion and return the assistant text.
    pub async fn complete(&self, messages: Vec<ApiMessage>) -> Result<String, ModelError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            stream: false,
        };
        debug!("POST chat/completions with {} messages", body.messages.len());

        let request = self
            .authorize(self.http.post(format!("{}/chat/completions", self.base_url)))
            .json(&body);
        let response = self.send(request).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Invocation(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ModelError::Invocation("empty completion".to_string()))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ModelError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout(self.timeout_secs)
            } else {
                ModelError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(ModelError::ApiError { status, message });
        }

        Ok(response)
    }
}
