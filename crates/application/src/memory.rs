//! 内存实现的存储接口（用于测试和本地开发）

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Message, RepositoryError, Room, RoomId, RoomMember, RoomSlug, User, UserId};
use tokio::sync::RwLock;

use crate::repository::{MessageRepository, RoomMemberRepository, RoomRepository, UserRepository};

#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create(&self, room: Room) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.id) || rooms.values().any(|r| r.slug == room.slug) {
            return Err(RepositoryError::Conflict);
        }
        rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &RoomSlug) -> Result<Option<Room>, RepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.values().find(|room| &room.slug == slug).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryRoomMemberRepository {
    // 房间ID -> 按加入顺序排列的成员
    members: Arc<RwLock<HashMap<RoomId, Vec<RoomMember>>>>,
}

impl InMemoryRoomMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomMemberRepository for InMemoryRoomMemberRepository {
    async fn add(&self, member: RoomMember) -> Result<(), RepositoryError> {
        let mut members = self.members.write().await;
        let entries = members.entry(member.room_id).or_default();
        if entries.iter().any(|m| m.user_id == member.user_id) {
            return Ok(());
        }
        entries.push(member);
        Ok(())
    }

    async fn list(&self, room_id: RoomId) -> Result<Vec<RoomMember>, RepositoryError> {
        let members = self.members.read().await;
        Ok(members.get(&room_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    // 房间ID -> 按插入顺序排列的消息（插入顺序即时间顺序）
    messages: Arc<RwLock<HashMap<RoomId, Vec<Message>>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 房间内消息总数（测试断言用）
    pub async fn count(&self, room_id: RoomId) -> usize {
        let messages = self.messages.read().await;
        messages.get(&room_id).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.write().await;
        messages
            .entry(message.room_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn list_page(
        &self,
        room_id: RoomId,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let Some(entries) = messages.get(&room_id) else {
            return Ok(Vec::new());
        };
        // 插入顺序反转即最新在前
        Ok(entries
            .iter()
            .rev()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}
