//! 对象存储适配器测试（wiremock 模拟存储端点）

use std::time::Duration;

use application::storage::{AttachmentStorage, UploadError};
use infrastructure::HttpObjectStorage;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_put_returns_public_url_with_random_key() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let storage = HttpObjectStorage::new(server.uri(), Duration::from_secs(2));

    let url1 = storage
        .put(vec![0x89, 0x50, 0x4e, 0x47], "image/png")
        .await
        .unwrap();
    let url2 = storage
        .put(vec![0x89, 0x50, 0x4e, 0x47], "image/png")
        .await
        .unwrap();

    assert!(url1.starts_with(&server.uri()));
    assert!(url1.ends_with(".png"));
    // 存储键随机生成，相同内容也不会碰撞
    assert_ne!(url1, url2);
}

#[tokio::test]
async fn test_unknown_content_type_uses_bin_extension() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let storage = HttpObjectStorage::new(server.uri(), Duration::from_secs(2));
    let url = storage
        .put(vec![1, 2, 3], "application/octet-stream")
        .await
        .unwrap();
    assert!(url.ends_with(".bin"));
}

#[tokio::test]
async fn test_error_status_is_upload_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let storage = HttpObjectStorage::new(server.uri(), Duration::from_secs(2));
    let err = storage.put(vec![1, 2, 3], "image/png").await.unwrap_err();
    assert!(matches!(err, UploadError::Failed(_)));
}

#[tokio::test]
async fn test_slow_storage_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let storage = HttpObjectStorage::new(server.uri(), Duration::from_millis(100));
    let err = storage.put(vec![1, 2, 3], "image/png").await.unwrap_err();
    assert!(matches!(err, UploadError::Timeout));
}
