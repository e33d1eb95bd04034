//! 房间成员实体定义

use serde::{Deserialize, Serialize};

use crate::value_objects::{RoomId, Timestamp, UserId};

/// 房间成员关系
///
/// (room_id, user_id) 组合唯一；重复加入是幂等的空操作。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
    /// 房间ID
    pub room_id: RoomId,
    /// 用户ID
    pub user_id: UserId,
    /// 加入时间
    pub joined_at: Timestamp,
}

impl RoomMember {
    pub fn new(room_id: RoomId, user_id: UserId, joined_at: Timestamp) -> Self {
        Self {
            room_id,
            user_id,
            joined_at,
        }
    }
}
