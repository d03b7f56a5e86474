use crate::ai::assembler::ChatMessage;
use crate::cache::SingleFlight;
use crate::config::Platform;
use crate::domain::outputs::PromptFormat;
use crate::error::{CallCenterError, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::any::type_name;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

const MAX_RETRIES: u32 = 3;

/// Chat completions client for one configured platform.
pub struct LlmClient {
    client: reqwest::Client,
    platform: Platform,
}

impl LlmClient {
    pub fn new(platform: Platform) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client, platform })
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    fn completions_url(&self) -> String {
        match &self.platform {
            Platform::AzureOpenai(p) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                p.settings.endpoint.trim_end_matches('/'),
                p.deployment,
                p.api_version
            ),
            Platform::Openai(p) => format!("{}/chat/completions", p.settings.endpoint.trim_end_matches('/')),
        }
    }

    fn payload(&self, messages: &[ChatMessage], response_schema: Option<(&str, Value)>) -> Value {
        let settings = self.platform.settings();
        let mut payload = json!({
            "model": settings.model,
            "messages": messages,
            "seed": settings.seed,
            "temperature": settings.temperature,
        });

        if let Some((name, schema)) = response_schema {
            payload["response_format"] = json!({
                "type": "json_schema",
                "json_schema": { "name": name, "schema": schema, "strict": true }
            });
        }
        payload
    }

    /// Sends the messages and returns the first choice's text.
    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<String> {
        self.invoke_with_retries(self.payload(messages, None)).await
    }

    /// Sends the messages constrained to `T`'s schema and parses the answer.
    pub async fn invoke_structured<T: PromptFormat + DeserializeOwned>(&self, messages: &[ChatMessage]) -> Result<T> {
        let name = type_name::<T>().rsplit("::").next().unwrap_or("Response");
        let payload = self.payload(messages, Some((name, T::response_schema()?)));
        let text = self.invoke_with_retries(payload).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn invoke_with_retries(&self, payload: Value) -> Result<String> {
        for attempt in 1..=MAX_RETRIES {
            match self.invoke_attempt(&payload).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    log::warn!("Attempt {attempt}/{MAX_RETRIES} failed: {e}");
                    if attempt == MAX_RETRIES {
                        return Err(e);
                    }
                    sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
            }
        }
        Err(CallCenterError::GenerationFailed("Max retries exceeded".into()))
    }

    async fn invoke_attempt(&self, payload: &Value) -> Result<String> {
        let request = self.client.post(self.completions_url()).json(payload);
        let request = match &self.platform {
            Platform::AzureOpenai(p) => request.header("api-key", p.api_key.expose()),
            Platform::Openai(p) => request.bearer_auth(p.api_key.expose()),
        };

        let res = request.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let err_text = res.text().await.unwrap_or_default();
            log::error!("API Error: {}", err_text);
            return Err(CallCenterError::GenerationFailed(format!("API Error {status}: {err_text}")));
        }

        let body: Value = res.json().await?;
        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| CallCenterError::GenerationFailed("No text content returned".into()))?;

        Ok(strip_code_fence(text))
    }
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the language tag on the opening line; a one-line fence has none.
    let inner = inner.split_once('\n').map_or(inner, |(_, rest)| rest);
    inner.strip_suffix("```").unwrap_or(inner).trim().to_string()
}

/// One client per distinct platform configuration, built on first use.
#[derive(Default)]
pub struct ClientCache {
    clients: SingleFlight<String, LlmClient>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, platform: &Platform) -> Result<Arc<LlmClient>> {
        let key = serde_json::to_string(platform)?;
        self.clients.get_or_try_init(key, || {
            log::info!("Creating LLM client for {:?} platform", platform.mode());
            LlmClient::new(platform.clone())
        })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
