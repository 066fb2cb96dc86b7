use serde_json::Value;

use crate::fixtures::test_app::{TestApp, TestModels};

#[tokio::test]
async fn health_lists_configured_modalities() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(
        json["modalities"],
        serde_json::json!(["image", "video", "audio"])
    );
}

#[tokio::test]
async fn health_omits_modalities_without_models() {
    let models = TestModels {
        image: None,
        ..TestModels::default()
    };
    let app = TestApp::spawn_with(models, |_| {}).await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["modalities"], serde_json::json!(["audio"]));
}
