//! PostgreSQL 存储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    DeviceToken, Message, MessageId, RepositoryError, Room, RoomId, RoomMember, RoomSlug, User,
    UserId, Username,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use application::repository::{
    MessageRepository, RoomMemberRepository, RoomRepository, UserRepository,
};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict;
        }
    }
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct RoomRecord {
    id: Uuid,
    slug: String,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RoomRecord> for Room {
    type Error = RepositoryError;

    fn try_from(value: RoomRecord) -> Result<Self, Self::Error> {
        let slug = RoomSlug::parse(value.slug).map_err(|err| invalid_data(err.to_string()))?;
        Room::new(
            RoomId::from(value.id),
            slug,
            value.title,
            value.description,
            value.created_at,
        )
        .map_err(|err| invalid_data(err.to_string()))
    }
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    display_name: Option<String>,
    device_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username =
            Username::parse(value.username).map_err(|err| invalid_data(err.to_string()))?;
        let device_token = match value.device_token {
            Some(token) => {
                Some(DeviceToken::new(token).map_err(|err| invalid_data(err.to_string()))?)
            }
            None => None,
        };

        User::new(
            UserId::from(value.id),
            username,
            value.display_name,
            device_token,
            value.created_at,
        )
        .map_err(|err| invalid_data(err.to_string()))
    }
}

#[derive(Debug, FromRow)]
struct MemberRecord {
    room_id: Uuid,
    user_id: Uuid,
    joined_at: DateTime<Utc>,
}

impl From<MemberRecord> for RoomMember {
    fn from(value: MemberRecord) -> Self {
        RoomMember::new(
            RoomId::from(value.room_id),
            UserId::from(value.user_id),
            value.joined_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    room_id: Uuid,
    sender_id: Uuid,
    text: Option<String>,
    attachment_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        Message::new(
            MessageId::from(value.id),
            RoomId::from(value.room_id),
            UserId::from(value.sender_id),
            value.text,
            value.attachment_url,
            value.created_at,
        )
        .map_err(|err| invalid_data(err.to_string()))
    }
}

#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn create(&self, room: Room) -> Result<Room, RepositoryError> {
        sqlx::query(
            "INSERT INTO rooms (id, slug, title, description, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::from(room.id))
        .bind(room.slug.as_str())
        .bind(&room.title)
        .bind(&room.description)
        .bind(room.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(room)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            "SELECT id, slug, title, description, created_at FROM rooms WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Room::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &RoomSlug) -> Result<Option<Room>, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            "SELECT id, slug, title, description, created_at FROM rooms WHERE slug = $1",
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Room::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgRoomMemberRepository {
    pool: PgPool,
}

impl PgRoomMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomMemberRepository for PgRoomMemberRepository {
    async fn add(&self, member: RoomMember) -> Result<(), RepositoryError> {
        // 幂等加入：重复的 (room_id, user_id) 直接忽略
        sqlx::query(
            "INSERT INTO room_members (room_id, user_id, joined_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (room_id, user_id) DO NOTHING",
        )
        .bind(Uuid::from(member.room_id))
        .bind(Uuid::from(member.user_id))
        .bind(member.joined_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn list(&self, room_id: RoomId) -> Result<Vec<RoomMember>, RepositoryError> {
        let records = sqlx::query_as::<_, MemberRecord>(
            "SELECT room_id, user_id, joined_at FROM room_members \
             WHERE room_id = $1 ORDER BY joined_at ASC, user_id ASC",
        )
        .bind(Uuid::from(room_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(RoomMember::from).collect())
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: Message) -> Result<Message, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "INSERT INTO messages (id, room_id, sender_id, text, attachment_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, room_id, sender_id, text, attachment_url, created_at",
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.room_id))
        .bind(Uuid::from(message.sender_id))
        .bind(&message.text)
        .bind(&message.attachment_url)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn list_page(
        &self,
        room_id: RoomId,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Message>, RepositoryError> {
        // 同一查询内的排序带确定性的次级键，保证翻页之间不重排
        let records = sqlx::query_as::<_, MessageRecord>(
            "SELECT id, room_id, sender_id, text, attachment_url, created_at FROM messages \
             WHERE room_id = $1 ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3",
        )
        .bind(Uuid::from(room_id))
        .bind(skip as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        sqlx::query(
            "INSERT INTO users (id, username, display_name, device_token, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::from(user.id))
        .bind(user.username.as_str())
        .bind(&user.display_name)
        .bind(user.device_token.as_ref().map(|t| t.as_str().to_owned()))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, display_name, device_token, created_at \
             FROM users WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, display_name, device_token, created_at \
             FROM users WHERE id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut users: Vec<User> = records
            .into_iter()
            .map(User::try_from)
            .collect::<Result<_, _>>()?;

        // 结果顺序与入参一致
        users.sort_by_key(|user| {
            ids.iter()
                .position(|id| *id == user.id)
                .unwrap_or(usize::MAX)
        });
        Ok(users)
    }
}
