//! 房间目录：房间标识解析、成员加入、成员列表

use std::sync::Arc;

use domain::{DeviceToken, DomainError, Room, RoomMember, RoomSlug, UserId};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::repository::{RoomMemberRepository, RoomRepository, UserRepository};

/// 房间标识的两种形态。
///
/// 调用方既可能传存储主键也可能传slug，解析成显式的标签类型，
/// 不靠运行时猜测。语法上不是合法UUID的输入直接当slug处理。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomIdentifier {
    Id(Uuid),
    Slug(String),
}

impl RoomIdentifier {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match Uuid::parse_str(trimmed) {
            Ok(id) => RoomIdentifier::Id(id),
            Err(_) => RoomIdentifier::Slug(trimmed.to_owned()),
        }
    }
}

/// 成员档案：展示名和推送令牌都在读取时从用户记录补齐。
#[derive(Debug, Clone, PartialEq)]
pub struct MemberProfile {
    pub user_id: UserId,
    pub name: String,
    pub device_token: Option<DeviceToken>,
}

pub struct RoomDirectoryDependencies {
    pub room_repository: Arc<dyn RoomRepository>,
    pub member_repository: Arc<dyn RoomMemberRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct RoomDirectory {
    deps: RoomDirectoryDependencies,
}

impl RoomDirectory {
    pub fn new(deps: RoomDirectoryDependencies) -> Self {
        Self { deps }
    }

    /// 解析房间标识。
    ///
    /// UUID形态先按主键查，未命中再回落到slug查找（slug理论上也可能
    /// 长得像UUID）；非UUID形态直接按slug查找。
    pub async fn resolve(&self, identifier: &str) -> Result<Room, ApplicationError> {
        match RoomIdentifier::parse(identifier) {
            RoomIdentifier::Id(id) => {
                if let Some(room) = self.deps.room_repository.find_by_id(id.into()).await? {
                    return Ok(room);
                }
                self.find_by_slug_str(identifier).await
            }
            RoomIdentifier::Slug(slug) => self.find_by_slug_str(&slug).await,
        }
    }

    /// 把用户加入房间。重复加入是幂等的空操作。
    pub async fn join(&self, slug: &str, user_id: UserId) -> Result<Room, ApplicationError> {
        let room = self.find_by_slug_str(slug).await?;

        let member = RoomMember::new(room.id, user_id, self.deps.clock.now());
        self.deps.member_repository.add(member).await?;

        tracing::info!(room_id = %room.id, user_id = %user_id, "用户加入房间");
        Ok(room)
    }

    /// 按加入顺序返回房间成员档案。
    ///
    /// 用户记录已经不存在的成员会被跳过（记日志），不让单条脏数据
    /// 拖垮整个列表。
    pub async fn list_members(&self, room: &Room) -> Result<Vec<MemberProfile>, ApplicationError> {
        let members = self.deps.member_repository.list(room.id).await?;
        let ids: Vec<UserId> = members.iter().map(|m| m.user_id).collect();
        let users = self.deps.user_repository.find_many(&ids).await?;

        let mut profiles = Vec::with_capacity(members.len());
        for member in &members {
            match users.iter().find(|u| u.id == member.user_id) {
                Some(user) => profiles.push(MemberProfile {
                    user_id: user.id,
                    name: user.visible_name().to_owned(),
                    device_token: user.device_token.clone(),
                }),
                None => {
                    tracing::warn!(
                        room_id = %room.id,
                        user_id = %member.user_id,
                        "成员对应的用户记录不存在，跳过"
                    );
                }
            }
        }
        Ok(profiles)
    }

    async fn find_by_slug_str(&self, raw: &str) -> Result<Room, ApplicationError> {
        let slug = RoomSlug::parse(raw).map_err(|_| DomainError::RoomNotFound)?;
        self.deps
            .room_repository
            .find_by_slug(&slug)
            .await?
            .ok_or_else(|| DomainError::RoomNotFound.into())
    }
}
