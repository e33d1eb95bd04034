//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、持久化顺序、
//! 以及对外部适配器（对象存储、推送网关、广播中心）的抽象。

pub mod clock;
pub mod error;
pub mod hub;
pub mod memory;
pub mod notify;
pub mod push;
pub mod repository;
pub mod services;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use hub::{BroadcastHub, BroadcastOutcome, PresenceHub, SessionId};
pub use notify::{DispatchReport, NotificationDispatcher, NotificationDispatcherDependencies};
pub use push::{PushGateway, PushGatewayError, PushMessage, PushOutcome};
pub use repository::{
    MessageRepository, RoomMemberRepository, RoomRepository, UserRepository,
};
pub use services::{
    AttachmentPayload, MemberProfile, MessageHistoryService, MessageHistoryServiceDependencies,
    RoomDirectory, RoomDirectoryDependencies, RoomIdentifier, SendMessageRequest,
    SendMessageService, SendMessageServiceDependencies, HISTORY_PAGE_SIZE,
};
pub use storage::{AttachmentStorage, UploadError};
