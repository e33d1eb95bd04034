use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// 单条推送消息，`to` 是设备令牌。
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

/// 网关返回的单条投递结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Ok,
    Error(String),
}

#[derive(Debug, Error)]
pub enum PushGatewayError {
    #[error("push gateway request failed: {0}")]
    Request(String),
    #[error("push gateway timed out")]
    Timeout,
}

/// 推送网关。
///
/// 一次 `send_batch` 的消息数量由调用方按网关上限分批，投递是尽力而为。
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// 提交前的令牌格式校验；不合法的令牌直接跳过，不进入批次。
    fn is_valid_token(&self, token: &str) -> bool;

    async fn send_batch(
        &self,
        messages: &[PushMessage],
    ) -> Result<Vec<PushOutcome>, PushGatewayError>;
}
