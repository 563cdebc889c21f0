//! OpenAI-compatible chat completions client (OpenAI, OpenRouter)

use super::ModelClient;
use crate::errors::ProviderError;
use crate::schema::OutputSchema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You convert text into JSON that matches the supplied schema. \
Extract only what is explicitly stated. Never infer, guess or evaluate. \
Use null for anything not stated. Output JSON only.";

/// Chat completions client with schema-constrained decoding
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat<'a>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    /// Create a new client
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        max_output_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url
                .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            max_output_tokens,
        })
    }

    fn build_request<'a>(&'a self, prompt: &'a str, schema: &'a OutputSchema) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_output_tokens,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: schema.name,
                    strict: true,
                    schema: &schema.schema,
                },
            },
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str, schema: &OutputSchema) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(prompt, schema);

        tracing::debug!(model = %self.model, schema = schema.name, "Calling model provider");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::EmptyCompletion)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
