//! 房间实体定义

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{RoomId, RoomSlug, Timestamp};

/// 房间实体
///
/// slug 全局唯一且创建后不可变；成员关系单独由 `RoomMember` 维护。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// 房间唯一ID（存储主键）
    pub id: RoomId,
    /// 面向用户的房间标识
    pub slug: RoomSlug,
    /// 房间标题
    pub title: String,
    /// 房间描述（可选）
    pub description: Option<String>,
    /// 创建时间
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(
        id: RoomId,
        slug: RoomSlug,
        title: impl Into<String>,
        description: Option<String>,
        created_at: Timestamp,
    ) -> DomainResult<Self> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(DomainError::invalid_argument("title", "cannot be empty"));
        }
        if title.len() > 200 {
            return Err(DomainError::invalid_argument("title", "too long"));
        }

        Ok(Self {
            id,
            slug,
            title,
            description,
            created_at,
        })
    }
}
