//! 消息历史查询测试

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use domain::{Message, MessageId, Room, RoomId, RoomSlug, User, UserId, Username};

use crate::memory::{InMemoryMessageRepository, InMemoryUserRepository};
use crate::repository::{MessageRepository, UserRepository};
use crate::services::history::{
    MessageHistoryService, MessageHistoryServiceDependencies, HISTORY_PAGE_SIZE,
};

struct Fixture {
    room: Room,
    sender: User,
    messages: Arc<InMemoryMessageRepository>,
    service: MessageHistoryService,
}

async fn fixture() -> Fixture {
    let messages = Arc::new(InMemoryMessageRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());

    let room = Room::new(
        RoomId::from(Uuid::new_v4()),
        RoomSlug::parse("general").unwrap(),
        "General",
        None,
        Utc::now(),
    )
    .unwrap();
    let sender = User::new(
        UserId::from(Uuid::new_v4()),
        Username::parse("alice").unwrap(),
        Some("Alice".to_string()),
        None,
        Utc::now(),
    )
    .unwrap();
    users.create(sender.clone()).await.unwrap();

    let service = MessageHistoryService::new(MessageHistoryServiceDependencies {
        message_repository: Arc::clone(&messages) as Arc<dyn MessageRepository>,
        user_repository: Arc::clone(&users) as Arc<dyn UserRepository>,
    });

    Fixture {
        room,
        sender,
        messages,
        service,
    }
}

/// 插入 count 条编号消息，时间戳单调递增
async fn seed_messages(fx: &Fixture, count: usize) {
    let base = Utc::now();
    for i in 0..count {
        let message = Message::new(
            MessageId::from(Uuid::new_v4()),
            fx.room.id,
            fx.sender.id,
            Some(format!("Message {}", i)),
            None,
            base + Duration::seconds(i as i64),
        )
        .unwrap();
        fx.messages.insert(message).await.unwrap();
    }
}

#[tokio::test]
async fn test_first_page_is_oldest_first_within_page() {
    let fx = fixture().await;
    seed_messages(&fx, 20).await;

    let page = fx.service.history(&fx.room, 1).await.unwrap();
    assert_eq!(page.len(), HISTORY_PAGE_SIZE as usize);
    // 页内从旧到新，与插入顺序一致
    for (i, event) in page.iter().enumerate() {
        assert_eq!(event.text.as_deref(), Some(format!("Message {}", i).as_str()));
    }
}

#[tokio::test]
async fn test_pages_are_newest_first_across_pages() {
    let fx = fixture().await;
    seed_messages(&fx, 25).await;

    // 第1页：最新的20条（5..24），页内正序
    let page1 = fx.service.history(&fx.room, 1).await.unwrap();
    assert_eq!(page1.len(), 20);
    assert_eq!(page1[0].text.as_deref(), Some("Message 5"));
    assert_eq!(page1[19].text.as_deref(), Some("Message 24"));

    // 第2页：剩下的5条最旧消息
    let page2 = fx.service.history(&fx.room, 2).await.unwrap();
    assert_eq!(page2.len(), 5);
    assert_eq!(page2[0].text.as_deref(), Some("Message 0"));
    assert_eq!(page2[4].text.as_deref(), Some("Message 4"));

    // 第3页为空
    let page3 = fx.service.history(&fx.room, 3).await.unwrap();
    assert!(page3.is_empty());
}

#[tokio::test]
async fn test_page_zero_and_negative_treated_as_first() {
    let fx = fixture().await;
    seed_messages(&fx, 3).await;

    let first = fx.service.history(&fx.room, 1).await.unwrap();
    assert_eq!(fx.service.history(&fx.room, 0).await.unwrap(), first);
    assert_eq!(fx.service.history(&fx.room, -5).await.unwrap(), first);
}

#[tokio::test]
async fn test_sender_is_hydrated_at_read_time() {
    let fx = fixture().await;
    seed_messages(&fx, 1).await;

    let page = fx.service.history(&fx.room, 1).await.unwrap();
    assert_eq!(page[0].sender.id, Uuid::from(fx.sender.id));
    assert_eq!(page[0].sender.name, "Alice");
    assert_eq!(page[0].room, "general");
}

#[tokio::test]
async fn test_empty_room_returns_empty_page() {
    let fx = fixture().await;
    let page = fx.service.history(&fx.room, 1).await.unwrap();
    assert!(page.is_empty());
}
