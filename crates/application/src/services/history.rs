//! 消息历史查询
//!
//! 存储侧按最新在前取页，返回前反转成页内从旧到新，客户端把整页
//! 前插到已有消息上就能自上而下按时间阅读。

use std::collections::HashMap;
use std::sync::Arc;

use domain::{EventSender, MessageEvent, Room, UserId};
use uuid::Uuid;

use crate::error::ApplicationError;
use crate::repository::{MessageRepository, UserRepository};

/// 固定的历史分页大小
pub const HISTORY_PAGE_SIZE: u64 = 20;

pub struct MessageHistoryServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub user_repository: Arc<dyn UserRepository>,
}

pub struct MessageHistoryService {
    deps: MessageHistoryServiceDependencies,
}

impl MessageHistoryService {
    pub fn new(deps: MessageHistoryServiceDependencies) -> Self {
        Self { deps }
    }

    /// 取房间历史的第 `page` 页（1起始，`page <= 0` 按 1 处理）。
    ///
    /// 页间最新在前、页内从旧到新；发送者信息在读取时联查补齐，
    /// 不在消息记录里冗余存储。
    pub async fn history(
        &self,
        room: &Room,
        page: i64,
    ) -> Result<Vec<MessageEvent>, ApplicationError> {
        let page = if page <= 0 { 1 } else { page as u64 };
        let skip = (page - 1) * HISTORY_PAGE_SIZE;

        let mut messages = self
            .deps
            .message_repository
            .list_page(room.id, skip, HISTORY_PAGE_SIZE)
            .await?;
        // 存储返回最新在前，页内反转成时间正序
        messages.reverse();

        let mut sender_ids: Vec<UserId> = Vec::new();
        for message in &messages {
            if !sender_ids.contains(&message.sender_id) {
                sender_ids.push(message.sender_id);
            }
        }
        let senders: HashMap<UserId, String> = self
            .deps
            .user_repository
            .find_many(&sender_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user.visible_name().to_owned()))
            .collect();

        Ok(messages
            .into_iter()
            .map(|message| {
                let name = senders
                    .get(&message.sender_id)
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_owned());
                MessageEvent {
                    id: Uuid::from(message.id),
                    room: room.slug.as_str().to_owned(),
                    sender: EventSender {
                        id: Uuid::from(message.sender_id),
                        name,
                    },
                    text: message.text,
                    attachment_url: message.attachment_url,
                    created_at: message.created_at,
                }
            })
            .collect())
    }
}
