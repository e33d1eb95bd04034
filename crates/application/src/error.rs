use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::storage::UploadError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
    /// 消息写入失败。写入是唯一的持久化提交点，失败后调用方可以安全重试。
    #[error("message persistence failed: {0}")]
    Persist(RepositoryError),
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl ApplicationError {
    pub fn infrastructure(message: impl Into<String>) -> Self {
        ApplicationError::Infrastructure(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Repository(value)
    }
}
