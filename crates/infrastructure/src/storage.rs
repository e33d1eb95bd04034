//! HTTP 对象存储适配器
//!
//! 以 `PUT {base_url}/{key}` 的形式写入兼容S3公开桶语义的存储端点，
//! 写入成功后同一URL即可公开读取。

use std::time::Duration;

use application::storage::{AttachmentStorage, UploadError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use uuid::Uuid;

pub struct HttpObjectStorage {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpObjectStorage {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout,
        }
    }

    /// 随机生成存储键：与用户输入无关，既防碰撞也防路径穿越。
    fn object_key(content_type: &str) -> String {
        let ext = match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        };
        format!("{}.{}", Uuid::new_v4(), ext)
    }
}

#[async_trait]
impl AttachmentStorage for HttpObjectStorage {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, UploadError> {
        let url = format!("{}/{}", self.base_url, Self::object_key(content_type));

        let request = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| UploadError::Timeout)?
            .map_err(|err| {
                if err.is_timeout() {
                    UploadError::Timeout
                } else {
                    UploadError::failed(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(UploadError::failed(format!(
                "object storage returned {}",
                response.status()
            )));
        }

        tracing::debug!(url = %url, "附件上传完成");
        Ok(url)
    }
}
