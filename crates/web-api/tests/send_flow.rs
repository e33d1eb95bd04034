//! 发送链路端到端测试：HTTP + WebSocket + wiremock 推送/存储

mod support;

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message as TungsteniteMessage};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use support::spawn_app;

async fn push_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"status": "ok"}]
        })))
        .mount(&server)
        .await;
    server
}

async fn storage_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

/// 等待异步推送到达 wiremock
async fn wait_for_push_requests(server: &MockServer, expected: usize) -> Vec<Request> {
    for _ in 0..100 {
        let requests = server.received_requests().await.unwrap_or_default();
        let posts: Vec<Request> = requests
            .into_iter()
            .filter(|r| r.method.as_str() == "POST")
            .collect();
        if posts.len() >= expected {
            return posts;
        }
        sleep(Duration::from_millis(10)).await;
    }
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .collect()
}

#[tokio::test]
async fn scenario_text_message_broadcast_and_offline_push() {
    let push = push_server().await;
    let storage = storage_server().await;
    let app = spawn_app(&push.uri(), &storage.uri()).await;

    // Alice 在线、Bob 离线但注册了推送令牌
    let alice = app.seed_user("alice", None).await;
    let bob = app.seed_user("bob", Some("ExponentPushToken[xyz]")).await;

    let client = reqwest::Client::new();
    for user in [alice, bob] {
        let response = client
            .post(app.http("/api/v1/rooms/general/join"))
            .json(&json!({"user_id": user}))
            .send()
            .await
            .expect("join");
        assert!(response.status().is_success());
    }

    // Alice 通过另一条连接订阅房间
    let (mut ws, _) = connect_async(app.ws(&format!("user_id={}&room=general", alice)))
        .await
        .expect("ws connect");
    sleep(Duration::from_millis(100)).await;

    // Alice 发送文本消息
    let response = client
        .post(app.http("/api/v1/messages"))
        .json(&json!({
            "room": "general",
            "sender_id": alice,
            "text": "hi"
        }))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status().as_u16(), 201);

    let event: Value = response.json().await.expect("event json");
    assert_eq!(event["room"], "general");
    assert_eq!(event["sender"]["name"], "alice");
    assert_eq!(event["text"], "hi");
    assert!(event["id"].as_str().is_some());

    // WebSocket 收到同一个事件
    let frame = timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("ws timely")
        .expect("ws frame")
        .expect("ws ok");
    let TungsteniteMessage::Text(payload) = frame else {
        panic!("expected text frame, got {:?}", frame);
    };
    let broadcast: Value = serde_json::from_str(&payload).expect("broadcast json");
    assert_eq!(broadcast["id"], event["id"]);
    assert_eq!(broadcast["text"], "hi");

    // 推送只发给 Bob
    let posts = wait_for_push_requests(&push, 1).await;
    assert_eq!(posts.len(), 1);
    let batch: Value = serde_json::from_slice(&posts[0].body).expect("push body");
    let batch = batch.as_array().expect("batch array");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0]["to"], "ExponentPushToken[xyz]");
    assert_eq!(batch[0]["title"], "General");
    assert_eq!(batch[0]["body"], "hi");
}

#[tokio::test]
async fn scenario_image_message_with_empty_text() {
    let push = push_server().await;
    let storage = storage_server().await;
    let app = spawn_app(&push.uri(), &storage.uri()).await;

    let alice = app.seed_user("alice", None).await;
    let bob = app.seed_user("bob", Some("ExponentPushToken[xyz]")).await;

    let client = reqwest::Client::new();
    for user in [alice, bob] {
        client
            .post(app.http("/api/v1/rooms/general/join"))
            .json(&json!({"user_id": user}))
            .send()
            .await
            .expect("join");
    }

    let png_bytes = [0x89u8, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];
    let response = client
        .post(app.http("/api/v1/messages"))
        .json(&json!({
            "room": "general",
            "sender_id": alice,
            "text": "",
            "attachment_data": data_encoding::BASE64.encode(&png_bytes),
            "attachment_content_type": "image/png"
        }))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status().as_u16(), 201);

    let event: Value = response.json().await.expect("event json");
    assert!(event["text"].is_null());
    let url = event["attachment_url"].as_str().expect("attachment url");
    assert!(url.starts_with(&storage.uri()));
    assert!(url.ends_with(".png"));

    // 历史第1页可以读到这条消息
    let history: Value = client
        .get(app.http("/api/v1/rooms/general/messages?page=1"))
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("history json");
    let items = history.as_array().expect("history array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["attachment_url"], url);

    // 推送正文回退到占位符
    let posts = wait_for_push_requests(&push, 1).await;
    let batch: Value = serde_json::from_slice(&posts[0].body).expect("push body");
    assert_eq!(batch[0]["body"], "Sent an image");
}

#[tokio::test]
async fn empty_message_is_rejected_with_no_side_effects() {
    let push = push_server().await;
    let storage = storage_server().await;
    let app = spawn_app(&push.uri(), &storage.uri()).await;
    let alice = app.seed_user("alice", None).await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.http("/api/v1/messages"))
        .json(&json!({
            "room": "general",
            "sender_id": alice,
            "text": "   "
        }))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "EMPTY_MESSAGE");

    // 没有消息被持久化
    let history: Value = client
        .get(app.http("/api/v1/rooms/general/messages"))
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("history json");
    assert!(history.as_array().unwrap().is_empty());
    // 没有任何上传发生
    assert!(storage.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn unknown_room_is_rejected_before_upload() {
    let push = push_server().await;
    let storage = storage_server().await;
    let app = spawn_app(&push.uri(), &storage.uri()).await;
    let alice = app.seed_user("alice", None).await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.http("/api/v1/messages"))
        .json(&json!({
            "room": "nowhere",
            "sender_id": alice,
            "text": "hi",
            "attachment_data": data_encoding::BASE64.encode(b"bytes"),
            "attachment_content_type": "image/png"
        }))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status().as_u16(), 404);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "ROOM_NOT_FOUND");
    assert!(storage.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn join_is_idempotent_over_http() {
    let push = push_server().await;
    let storage = storage_server().await;
    let app = spawn_app(&push.uri(), &storage.uri()).await;
    let alice = app.seed_user("alice", None).await;

    let client = reqwest::Client::new();
    for _ in 0..2 {
        let response = client
            .post(app.http("/api/v1/rooms/general/join"))
            .json(&json!({"user_id": alice}))
            .send()
            .await
            .expect("join");
        assert!(response.status().is_success());
    }

    let members: Value = client
        .get(app.http("/api/v1/rooms/general/members"))
        .send()
        .await
        .expect("members")
        .json()
        .await
        .expect("members json");
    let members = members.as_array().expect("members array");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["name"], "alice");
}

#[tokio::test]
async fn history_is_paginated_oldest_first_within_page() {
    let push = push_server().await;
    let storage = storage_server().await;
    let app = spawn_app(&push.uri(), &storage.uri()).await;
    let alice = app.seed_user("alice", None).await;

    let client = reqwest::Client::new();
    client
        .post(app.http("/api/v1/rooms/general/join"))
        .json(&json!({"user_id": alice}))
        .send()
        .await
        .expect("join");

    for i in 0..25 {
        let response = client
            .post(app.http("/api/v1/messages"))
            .json(&json!({
                "room": "general",
                "sender_id": alice,
                "text": format!("Message {}", i)
            }))
            .send()
            .await
            .expect("send");
        assert_eq!(response.status().as_u16(), 201);
    }

    let page1: Value = client
        .get(app.http("/api/v1/rooms/general/messages?page=1"))
        .send()
        .await
        .expect("page1")
        .json()
        .await
        .expect("page1 json");
    let page1 = page1.as_array().expect("array");
    assert_eq!(page1.len(), 20);
    assert_eq!(page1[0]["text"], "Message 5");
    assert_eq!(page1[19]["text"], "Message 24");

    let page2: Value = client
        .get(app.http("/api/v1/rooms/general/messages?page=2"))
        .send()
        .await
        .expect("page2")
        .json()
        .await
        .expect("page2 json");
    let page2 = page2.as_array().expect("array");
    assert_eq!(page2.len(), 5);
    assert_eq!(page2[0]["text"], "Message 0");
    assert_eq!(page2[4]["text"], "Message 4");
}
