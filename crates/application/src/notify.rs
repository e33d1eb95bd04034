//! 离线推送通知分发
//!
//! 对"房间成员 - 当前在线 - 发送者自己"的补集做推送。整条链路都是
//! 尽力而为：单个坏令牌跳过、单个批次失败记日志，绝不向发送方传播。

use std::collections::HashSet;
use std::sync::Arc;

use domain::{Message, Room, UserId};
use serde_json::json;

use crate::hub::BroadcastHub;
use crate::push::{PushGateway, PushMessage, PushOutcome};
use crate::services::room_directory::RoomDirectory;

/// 一次分发的结果汇总。只用于日志和测试观察，不参与错误传播。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 离线补集中的成员数（不含发送者）
    pub offline_members: usize,
    /// 没有令牌或令牌格式不合法而被跳过的成员数
    pub skipped: usize,
    /// 网关确认接收的消息数
    pub submitted: usize,
    /// 投递失败的消息数（网关错误或批次提交失败）
    pub failed: usize,
}

pub struct NotificationDispatcherDependencies {
    pub directory: Arc<RoomDirectory>,
    pub hub: Arc<dyn BroadcastHub>,
    pub gateway: Arc<dyn PushGateway>,
    /// 推送网关单批上限
    pub batch_size: usize,
}

pub struct NotificationDispatcher {
    deps: NotificationDispatcherDependencies,
}

impl NotificationDispatcher {
    pub fn new(deps: NotificationDispatcherDependencies) -> Self {
        Self { deps }
    }

    /// 给房间内当前不在线的成员推送新消息通知。
    ///
    /// 在广播完成之后异步调用；任何失败都不影响消息本身。
    pub async fn notify_offline(
        &self,
        room: &Room,
        exclude_sender: UserId,
        message: &Message,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        let members = match self.deps.directory.list_members(room).await {
            Ok(members) => members,
            Err(err) => {
                tracing::warn!(
                    room_id = %room.id,
                    error = %err,
                    "离线通知：读取成员列表失败，放弃本次分发"
                );
                return report;
            }
        };

        let connected: HashSet<UserId> = self.deps.hub.connected_user_ids(room.id);

        let mut pending = Vec::new();
        for member in members {
            if member.user_id == exclude_sender || connected.contains(&member.user_id) {
                continue;
            }
            report.offline_members += 1;

            let Some(token) = member.device_token.as_ref() else {
                report.skipped += 1;
                continue;
            };
            if !self.deps.gateway.is_valid_token(token.as_str()) {
                report.skipped += 1;
                tracing::debug!(user_id = %member.user_id, "skipping malformed device token");
                continue;
            }

            pending.push(PushMessage {
                to: token.as_str().to_owned(),
                title: room.title.clone(),
                body: message.preview(120),
                data: json!({
                    "room": room.slug.as_str(),
                    "messageId": uuid::Uuid::from(message.id),
                }),
            });
        }

        for chunk in pending.chunks(self.deps.batch_size.max(1)) {
            match self.deps.gateway.send_batch(chunk).await {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        match outcome {
                            PushOutcome::Ok => report.submitted += 1,
                            PushOutcome::Error(reason) => {
                                report.failed += 1;
                                tracing::warn!(reason = %reason, "推送网关拒绝了一条消息");
                            }
                        }
                    }
                }
                Err(err) => {
                    report.failed += chunk.len();
                    tracing::warn!(
                        room_id = %room.id,
                        batch_len = chunk.len(),
                        error = %err,
                        "推送批次提交失败"
                    );
                }
            }
        }

        tracing::info!(
            room_id = %room.id,
            offline = report.offline_members,
            skipped = report.skipped,
            submitted = report.submitted,
            failed = report.failed,
            "离线通知分发完成"
        );
        report
    }
}
