//! 消息实体定义
//!
//! 包含消息的核心信息和创建时的内容校验。

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{MessageId, RoomId, Timestamp, UserId};

/// 纯附件消息在推送通知里的正文占位符。
pub const IMAGE_PLACEHOLDER: &str = "Sent an image";

/// 消息内容长度上限
const MAX_TEXT_LENGTH: usize = 10_000;

/// 消息实体
///
/// 不变量：文本和附件URL至少存在一个；创建后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// 消息唯一ID
    pub id: MessageId,
    /// 房间ID
    pub room_id: RoomId,
    /// 发送者ID
    pub sender_id: UserId,
    /// 消息文本（可选）
    pub text: Option<String>,
    /// 附件URL（可选）
    pub attachment_url: Option<String>,
    /// 发送时间
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        id: MessageId,
        room_id: RoomId,
        sender_id: UserId,
        text: Option<String>,
        attachment_url: Option<String>,
        created_at: Timestamp,
    ) -> DomainResult<Self> {
        let text = Self::normalize_text(text)?;
        let attachment_url = attachment_url.filter(|url| !url.trim().is_empty());

        if text.is_none() && attachment_url.is_none() {
            return Err(DomainError::EmptyMessage);
        }

        Ok(Self {
            id,
            room_id,
            sender_id,
            text,
            attachment_url,
            created_at,
        })
    }

    /// 推送通知正文：消息文本，纯附件消息回退到占位符。
    pub fn notification_body(&self) -> &str {
        self.text.as_deref().unwrap_or(IMAGE_PLACEHOLDER)
    }

    /// 获取消息的简短预览（用于通知等）
    pub fn preview(&self, max_chars: usize) -> String {
        let body = self.notification_body();
        if body.chars().count() <= max_chars {
            body.to_owned()
        } else {
            let truncated: String = body.chars().take(max_chars).collect();
            format!("{}...", truncated)
        }
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment_url.is_some()
    }

    fn normalize_text(text: Option<String>) -> DomainResult<Option<String>> {
        match text {
            None => Ok(None),
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                if trimmed.len() > MAX_TEXT_LENGTH {
                    return Err(DomainError::invalid_argument("text", "too long"));
                }
                Ok(Some(trimmed.to_owned()))
            }
        }
    }
}
