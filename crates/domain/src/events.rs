//! 对外广播的事件结构
//!
//! `MessageEvent` 同时是 WebSocket 广播载荷和发送接口的同步响应。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Message, Room, User};
use crate::value_objects::Timestamp;

/// 事件中内嵌的发送者信息（读取时从用户记录反规范化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSender {
    pub id: Uuid,
    pub name: String,
}

/// 新消息事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: Uuid,
    /// 房间slug
    pub room: String,
    pub sender: EventSender,
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    pub created_at: Timestamp,
}

impl MessageEvent {
    pub fn from_parts(message: &Message, room: &Room, sender: &User) -> Self {
        Self {
            id: Uuid::from(message.id),
            room: room.slug.as_str().to_owned(),
            sender: EventSender {
                id: Uuid::from(sender.id),
                name: sender.visible_name().to_owned(),
            },
            text: message.text.clone(),
            attachment_url: message.attachment_url.clone(),
            created_at: message.created_at,
        }
    }
}
