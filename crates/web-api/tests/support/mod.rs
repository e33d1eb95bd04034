//! 测试支撑：内存存储 + wiremock 适配器拼装出完整服务

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use uuid::Uuid;

use application::memory::{
    InMemoryMessageRepository, InMemoryRoomMemberRepository, InMemoryRoomRepository,
    InMemoryUserRepository,
};
use application::repository::{RoomRepository, UserRepository};
use application::{
    AttachmentStorage, BroadcastHub, MessageHistoryService, MessageHistoryServiceDependencies,
    NotificationDispatcher, NotificationDispatcherDependencies, PresenceHub, PushGateway,
    RoomDirectory, RoomDirectoryDependencies, SendMessageService, SendMessageServiceDependencies,
    SystemClock,
};
use domain::{DeviceToken, Room, RoomId, RoomSlug, User, UserId, Username};
use infrastructure::{ExpoPushGateway, HttpObjectStorage};
use web_api::{router, AppState};

pub struct TestApp {
    pub addr: SocketAddr,
    pub users: Arc<InMemoryUserRepository>,
    _shutdown: oneshot::Sender<()>,
}

impl TestApp {
    pub fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws(&self, query: &str) -> String {
        format!("ws://{}/ws?{}", self.addr, query)
    }

    pub async fn seed_user(&self, name: &str, token: Option<&str>) -> Uuid {
        let user = User::new(
            UserId::from(Uuid::new_v4()),
            Username::parse(name).unwrap(),
            None,
            token.map(|t| DeviceToken::new(t).unwrap()),
            Utc::now(),
        )
        .unwrap();
        let id = Uuid::from(user.id);
        self.users.create(user).await.unwrap();
        id
    }
}

/// 启动绑定在随机端口上的完整服务。
///
/// `push_endpoint` / `storage_base_url` 通常指向测试里的 wiremock 服务。
pub async fn spawn_app(push_endpoint: &str, storage_base_url: &str) -> TestApp {
    let rooms = Arc::new(InMemoryRoomRepository::new());
    let members = Arc::new(InMemoryRoomMemberRepository::new());
    let messages = Arc::new(InMemoryMessageRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());

    // 预置场景房间 "general"
    let room = Room::new(
        RoomId::from(Uuid::new_v4()),
        RoomSlug::parse("general").unwrap(),
        "General",
        None,
        Utc::now(),
    )
    .unwrap();
    rooms.create(room).await.unwrap();

    let hub = Arc::new(PresenceHub::new(16));
    let clock = Arc::new(SystemClock);

    let storage: Arc<dyn AttachmentStorage> = Arc::new(HttpObjectStorage::new(
        storage_base_url,
        Duration::from_secs(2),
    ));
    let gateway: Arc<dyn PushGateway> = Arc::new(ExpoPushGateway::new(
        push_endpoint,
        Duration::from_secs(2),
    ));

    let directory = Arc::new(RoomDirectory::new(RoomDirectoryDependencies {
        room_repository: rooms,
        member_repository: members.clone(),
        user_repository: users.clone(),
        clock: clock.clone(),
    }));

    let dispatcher = Arc::new(NotificationDispatcher::new(
        NotificationDispatcherDependencies {
            directory: directory.clone(),
            hub: hub.clone() as Arc<dyn BroadcastHub>,
            gateway,
            batch_size: 100,
        },
    ));

    let send_service = Arc::new(SendMessageService::new(SendMessageServiceDependencies {
        directory: directory.clone(),
        message_repository: messages.clone(),
        user_repository: users.clone(),
        storage,
        hub: hub.clone() as Arc<dyn BroadcastHub>,
        dispatcher,
        clock,
    }));

    let history_service = Arc::new(MessageHistoryService::new(
        MessageHistoryServiceDependencies {
            message_repository: messages,
            user_repository: users.clone(),
        },
    ));

    let state = AppState::new(directory, send_service, history_service, hub);
    let app = router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    TestApp {
        addr,
        users,
        _shutdown: shutdown_tx,
    }
}
