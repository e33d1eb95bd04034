//! 基础设施适配器
//!
//! 应用层端口的具体实现：PostgreSQL 存储、HTTP 对象存储、
//! Expo 形态的推送网关。

pub mod db;
pub mod push;
pub mod storage;

pub use db::{
    create_pg_pool, PgMessageRepository, PgRoomMemberRepository, PgRoomRepository,
    PgUserRepository,
};
pub use push::{ExpoPushGateway, EXPO_PUSH_ENDPOINT};
pub use storage::HttpObjectStorage;
