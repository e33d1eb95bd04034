use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Failed(String),
    #[error("upload timed out")]
    Timeout,
}

impl UploadError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 附件对象存储。
///
/// 存储键由实现方随机生成（不基于用户输入），返回可公开读取的完整URL。
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, UploadError>;
}
