use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{ChatMessage, InferenceClient};

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `POST {base}/chat/completions` client.
pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    api_key: String,
    json_mode: bool,
}

impl ChatCompletionsClient {
    pub fn new(base_url: &Url, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("signal_desk/0.1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            api_key,
            json_mode: false,
        })
    }

    /// Ask the provider for `response_format: json_object` output.
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    fn request_body<'a>(&self, model: &'a str, messages: &'a [ChatMessage]) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages,
            response_format: self.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[async_trait]
impl InferenceClient for ChatCompletionsClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting completion from {} ({})", url, model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(model, messages))
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {}: {}", status.as_u16(), body);
        }

        let data = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse JSON response")?;

        data.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("No response from inference API")
    }
}
