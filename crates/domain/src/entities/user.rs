//! 用户实体定义
//!
//! 这里只建模消息核心需要的用户信息：身份、展示名和推送令牌。

use serde::{Deserialize, Serialize};

use crate::errors::DomainResult;
use crate::value_objects::{DeviceToken, Timestamp, UserId, Username};

/// 用户实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// 用户唯一ID
    pub id: UserId,
    /// 用户名（唯一）
    pub username: Username,
    /// 显示名称（可选）
    pub display_name: Option<String>,
    /// 注册的推送设备令牌（可选）
    pub device_token: Option<DeviceToken>,
    /// 创建时间
    pub created_at: Timestamp,
}

impl User {
    pub fn new(
        id: UserId,
        username: Username,
        display_name: Option<String>,
        device_token: Option<DeviceToken>,
        created_at: Timestamp,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            username,
            display_name,
            device_token,
            created_at,
        })
    }

    /// 对外展示的名字：优先显示名，缺省回退到用户名。
    pub fn visible_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.username.as_str())
    }
}
