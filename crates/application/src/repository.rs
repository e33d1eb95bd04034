use async_trait::async_trait;
use domain::{Message, RepositoryError, Room, RoomId, RoomMember, RoomSlug, User, UserId};

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 房间由管理/初始化流程创建，消息核心只读。
    async fn create(&self, room: Room) -> Result<Room, RepositoryError>;
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError>;
    async fn find_by_slug(&self, slug: &RoomSlug) -> Result<Option<Room>, RepositoryError>;
}

#[async_trait]
pub trait RoomMemberRepository: Send + Sync {
    /// 幂等插入：(room_id, user_id) 已存在时是空操作。
    async fn add(&self, member: RoomMember) -> Result<(), RepositoryError>;

    /// 按加入时间排序返回房间全部成员。
    async fn list(&self, room_id: RoomId) -> Result<Vec<RoomMember>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: Message) -> Result<Message, RepositoryError>;

    // 获取房间消息，按创建时间倒序（最新在前），skip/limit 分页
    async fn list_page(
        &self,
        room_id: RoomId,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Message>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    // 批量查找；结果顺序与入参一致，未找到的ID被跳过
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError>;
}
