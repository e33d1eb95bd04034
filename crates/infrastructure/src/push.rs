//! Expo 形态的推送网关适配器
//!
//! 接口契约：POST 一个消息数组，响应里按同样的顺序返回每条的
//! 投递回执。单批上限由调用方控制（Expo 文档上限是100条）。

use std::time::Duration;

use application::push::{PushGateway, PushGatewayError, PushMessage, PushOutcome};
use async_trait::async_trait;
use serde::Deserialize;

/// Expo 官方推送端点
pub const EXPO_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

const TOKEN_PREFIX: &str = "ExponentPushToken[";
const TOKEN_SUFFIX: char = ']';

#[derive(Debug, Deserialize)]
struct PushTicket {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    data: Vec<PushTicket>,
}

pub struct ExpoPushGateway {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl ExpoPushGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    fn is_valid_token(&self, token: &str) -> bool {
        token.starts_with(TOKEN_PREFIX)
            && token.ends_with(TOKEN_SUFFIX)
            && token.len() > TOKEN_PREFIX.len() + 1
    }

    async fn send_batch(
        &self,
        messages: &[PushMessage],
    ) -> Result<Vec<PushOutcome>, PushGatewayError> {
        let request = self.client.post(&self.endpoint).json(messages).send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| PushGatewayError::Timeout)?
            .map_err(|err| {
                if err.is_timeout() {
                    PushGatewayError::Timeout
                } else {
                    PushGatewayError::Request(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(PushGatewayError::Request(format!(
                "push gateway returned {}",
                response.status()
            )));
        }

        let parsed: PushResponse = response
            .json()
            .await
            .map_err(|err| PushGatewayError::Request(err.to_string()))?;

        Ok(parsed
            .data
            .into_iter()
            .map(|ticket| {
                if ticket.status == "ok" {
                    PushOutcome::Ok
                } else {
                    PushOutcome::Error(
                        ticket.message.unwrap_or_else(|| ticket.status.clone()),
                    )
                }
            })
            .collect())
    }
}
