#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatBackend;
use crate::domain::models::ExchangeError;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Talks to the RAG service's `/chat` endpoint.
pub struct HttpChat {
    url: String,
    timeout: String,
    client: reqwest::Client,
}

impl Default for HttpChat {
    fn default() -> HttpChat {
        return HttpChat::new(
            &Config::get(ConfigKey::ChatUrl),
            &Config::get(ConfigKey::BackendHealthCheckTimeout),
        );
    }
}

impl HttpChat {
    pub fn new(url: &str, timeout: &str) -> HttpChat {
        return HttpChat {
            url: url.trim_end_matches('/').to_string(),
            timeout: timeout.to_string(),
            client: reqwest::Client::new(),
        };
    }
}

#[async_trait]
impl ChatBackend for HttpChat {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Chat URL is not defined");
        }

        let res = self
            .client
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Chat service is not reachable");
                bail!("Chat service is not reachable");
            }
        };

        let status = res.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Chat service health check failed");
            bail!("Chat service health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn send(&self, text: &str) -> Result<String, ExchangeError> {
        let req = ChatRequest {
            message: text.to_string(),
        };

        let res = self
            .client
            .post(format!("{url}/chat", url = self.url))
            .json(&req)
            .send()
            .await
            .map_err(|err| return ExchangeError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                "Failed to make chat request to the chat service"
            );
            return Err(ExchangeError::UnsuccessfulStatus(status.as_u16()));
        }

        let body = res
            .text()
            .await
            .map_err(|err| return ExchangeError::Transport(err.to_string()))?;

        let chat_res = serde_json::from_str::<ChatResponse>(&body)
            .map_err(|err| return ExchangeError::MalformedResponse(err.to_string()))?;
        tracing::debug!(body = ?chat_res, "Chat response");

        return Ok(chat_res.response);
    }
}
