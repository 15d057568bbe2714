//! Generic OpenAI-chat-completions-shaped `LlmProvider`.
//! Both cascade tiers (primary, fallback) and the reflection tier speak the
//! same wire shape, so one implementation parameterized by `ProviderConfig`
//! covers all three.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use termin_config::ProviderConfig;
use termin_core::{CascadePrompt, LlmProvider, ProviderError};
use tracing::warn;

#[derive(Clone)]
pub struct HttpLlmProvider {
    name: String,
    client: Client,
    model: String,
    base_url: String,
    api_key: String,
}

impl HttpLlmProvider {
    #[must_use]
    pub fn new(name: impl Into<String>, config: &ProviderConfig) -> Self {
        Self {
            name: name.into(),
            client: Client::new(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn to_provider_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
                provider: self.name.clone(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthFailure {
                provider: self.name.clone(),
                status: status.as_u16(),
            },
            s if s.is_server_error() => ProviderError::ServerError {
                provider: self.name.clone(),
                status: status.as_u16(),
            },
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(provider = %self.name, %status, body, "llm provider rejected request");
                ProviderError::ClientError {
                    provider: self.name.clone(),
                    status: status.as_u16(),
                }
            }
        }
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        prompt: &CascadePrompt,
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user},
            ],
            "temperature": 0.1,
        });

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(ProviderError::Network {
                    provider: self.name.clone(),
                    source: source.into(),
                });
            }
            Err(_) => {
                return Err(ProviderError::Timeout {
                    provider: self.name.clone(),
                });
            }
        };

        if !response.status().is_success() {
            return Err(self.to_provider_error(response).await);
        }

        let parsed: serde_json::Value = match tokio::time::timeout(timeout, response.json()).await
        {
            Ok(Ok(value)) => value,
            Ok(Err(source)) => {
                return Err(ProviderError::Network {
                    provider: self.name.clone(),
                    source: source.into(),
                });
            }
            Err(_) => {
                return Err(ProviderError::Timeout {
                    provider: self.name.clone(),
                });
            }
        };

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Network {
                provider: self.name.clone(),
                source: anyhow::anyhow!("response missing choices[0].message.content"),
            })
    }
}
