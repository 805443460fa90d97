//! One-shot pick + submit, as run by `caption-viewer caption <FILE>`.

use std::io::Write;
use std::path::Path;

use caption_viewer::client::caption_once;
use caption_viewer::{HttpCaptionClient, PreviewStore, SelectedFile, ViewerError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::File::create(&path)
        .unwrap()
        .write_all(contents)
        .unwrap();
    path
}

fn client_for(server: &MockServer) -> HttpCaptionClient {
    HttpCaptionClient::with_endpoint(format!("{}/upload_image", server.uri()))
}

#[tokio::test]
async fn test_caption_once_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "caption": "a red car",
            "detected_colors": ["red", "black"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = SelectedFile::from_path(&write_file(dir.path(), "car.png", b"png"))
        .await
        .unwrap();

    let previews = PreviewStore::new();
    let state = caption_once(&client_for(&mock_server), file, &previews).await;

    assert!(state.succeeded());
    assert!(!state.is_loading());
    assert_eq!(state.caption(), Some("a red car"));
    assert_eq!(state.detected_colors(), ["red", "black"]);
}

#[tokio::test]
async fn test_caption_once_rejected_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_image"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "detail": "unsupported format" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = SelectedFile::from_path(&write_file(dir.path(), "car.gif", b"gif"))
        .await
        .unwrap();

    let previews = PreviewStore::new();
    let state = caption_once(&client_for(&mock_server), file, &previews).await;

    assert!(!state.succeeded());
    assert!(!state.is_loading());
    assert_eq!(
        state.error(),
        Some(&ViewerError::ServerRejected("unsupported format".into()))
    );
}

#[tokio::test]
async fn test_caption_once_non_image_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = SelectedFile::from_path(&write_file(dir.path(), "notes.txt", b"hello"))
        .await
        .unwrap();
    assert_eq!(file.content_type, "application/octet-stream");

    let previews = PreviewStore::new();
    let state = caption_once(&client_for(&mock_server), file, &previews).await;

    assert!(!state.succeeded());
    assert_eq!(state.error(), Some(&ViewerError::InvalidFileType));
    assert!(previews.is_empty());
}
