//! 主应用程序入口
//!
//! 组装存储、广播中心、推送网关并启动 Axum 服务。

use std::sync::Arc;
use std::time::Duration;

use application::{
    AttachmentStorage, BroadcastHub, MessageHistoryService, MessageHistoryServiceDependencies,
    NotificationDispatcher, NotificationDispatcherDependencies, PresenceHub, PushGateway,
    RoomDirectory, RoomDirectoryDependencies, SendMessageService, SendMessageServiceDependencies,
    SystemClock,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, ExpoPushGateway, HttpObjectStorage, PgMessageRepository,
    PgRoomMemberRepository, PgRoomRepository, PgUserRepository,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app_config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "连接数据库: {}",
        app_config
            .database
            .url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(
        &app_config.database.url,
        app_config.database.max_connections,
    )
    .await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 存储适配器
    let room_repository = Arc::new(PgRoomRepository::new(pg_pool.clone()));
    let member_repository = Arc::new(PgRoomMemberRepository::new(pg_pool.clone()));
    let message_repository = Arc::new(PgMessageRepository::new(pg_pool.clone()));
    let user_repository = Arc::new(PgUserRepository::new(pg_pool));

    let storage: Arc<dyn AttachmentStorage> = Arc::new(HttpObjectStorage::new(
        app_config.storage.base_url.clone(),
        Duration::from_secs(app_config.storage.timeout_secs),
    ));
    let gateway: Arc<dyn PushGateway> = Arc::new(ExpoPushGateway::new(
        app_config.push.endpoint.clone(),
        Duration::from_secs(app_config.push.timeout_secs),
    ));

    // 进程内广播中心
    let hub = Arc::new(PresenceHub::new(app_config.hub.session_queue_capacity));
    let clock = Arc::new(SystemClock);

    // 应用层服务
    let directory = Arc::new(RoomDirectory::new(RoomDirectoryDependencies {
        room_repository,
        member_repository,
        user_repository: user_repository.clone(),
        clock: clock.clone(),
    }));

    let dispatcher = Arc::new(NotificationDispatcher::new(
        NotificationDispatcherDependencies {
            directory: directory.clone(),
            hub: hub.clone() as Arc<dyn BroadcastHub>,
            gateway,
            batch_size: app_config.push.batch_size,
        },
    ));

    let send_service = Arc::new(SendMessageService::new(SendMessageServiceDependencies {
        directory: directory.clone(),
        message_repository: message_repository.clone(),
        user_repository: user_repository.clone(),
        storage,
        hub: hub.clone() as Arc<dyn BroadcastHub>,
        dispatcher,
        clock,
    }));

    let history_service = Arc::new(MessageHistoryService::new(
        MessageHistoryServiceDependencies {
            message_repository,
            user_repository,
        },
    ));

    let state = AppState::new(directory, send_service, history_service, hub);

    // 启动 Web 服务器
    let app = router(state);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("消息服务启动在 http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
