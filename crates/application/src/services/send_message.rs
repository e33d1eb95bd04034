//! 发送消息编排
//!
//! 单条消息的完整链路：校验 → 解析房间 → （上传附件）→ 持久化 →
//! 广播 → 异步离线推送。持久化是唯一的提交点：写入成功后无论后续
//! 广播或推送发生什么，消息都是既成事实并同步返回给发送者。

use std::sync::Arc;

use domain::{DomainError, Message, MessageEvent, MessageId, UserId};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::hub::BroadcastHub;
use crate::notify::NotificationDispatcher;
use crate::repository::{MessageRepository, UserRepository};
use crate::services::room_directory::RoomDirectory;
use crate::storage::AttachmentStorage;

/// 待上传的附件载荷
#[derive(Debug, Clone)]
pub struct AttachmentPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// 入站发送请求。调用方已完成认证，房间标识可以是主键或slug。
#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub room_identifier: String,
    pub sender_id: Uuid,
    pub text: Option<String>,
    pub attachment: Option<AttachmentPayload>,
}

pub struct SendMessageServiceDependencies {
    pub directory: Arc<RoomDirectory>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub storage: Arc<dyn AttachmentStorage>,
    pub hub: Arc<dyn BroadcastHub>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub clock: Arc<dyn Clock>,
}

pub struct SendMessageService {
    deps: SendMessageServiceDependencies,
}

impl SendMessageService {
    pub fn new(deps: SendMessageServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn send(
        &self,
        request: SendMessageRequest,
    ) -> Result<MessageEvent, ApplicationError> {
        // 1. 空消息在产生任何副作用之前拒绝
        let has_text = request
            .text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        if !has_text && request.attachment.is_none() {
            return Err(DomainError::EmptyMessage.into());
        }

        // 2. 解析房间；失败则下游什么都不执行
        let room = self.deps.directory.resolve(&request.room_identifier).await?;

        let sender_id = UserId::from(request.sender_id);
        let sender = self
            .deps
            .user_repository
            .find_by_id(sender_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        // 3. 附件先上传；失败就中止，绝不持久化指向坏URL的消息
        let attachment_url = match request.attachment {
            Some(attachment) => Some(
                self.deps
                    .storage
                    .put(attachment.bytes, &attachment.content_type)
                    .await?,
            ),
            None => None,
        };

        // 4. 持久化，唯一的提交点
        let message = Message::new(
            MessageId::from(Uuid::new_v4()),
            room.id,
            sender_id,
            request.text,
            attachment_url,
            self.deps.clock.now(),
        )?;
        let stored = self
            .deps
            .message_repository
            .insert(message)
            .await
            .map_err(ApplicationError::Persist)?;

        tracing::info!(
            message_id = %stored.id,
            room_id = %room.id,
            sender_id = %sender_id,
            "消息已持久化"
        );

        // 5. 广播给房间内的在线会话；个别会话投递失败只记日志
        let event = MessageEvent::from_parts(&stored, &room, &sender);
        let outcome = self.deps.hub.broadcast(room.id, &event);
        if outcome.dropped > 0 {
            tracing::warn!(
                message_id = %stored.id,
                room_id = %room.id,
                dropped = outcome.dropped,
                "部分会话未收到广播"
            );
        }

        // 6. 离线推送在广播之后异步执行，对发送者完全不可见
        let dispatcher = Arc::clone(&self.deps.dispatcher);
        let notify_room = room.clone();
        tokio::spawn(async move {
            dispatcher
                .notify_offline(&notify_room, sender_id, &stored)
                .await;
        });

        Ok(event)
    }
}
