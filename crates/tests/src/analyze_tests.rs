use std::sync::Arc;

use mediascan_analysis::model::mock::MockImageModel;
use reqwest::multipart;
use serde_json::Value;

use crate::fixtures::media::{animated_gif, garbage, png, silent_wav};
use crate::fixtures::test_app::{
    MOCK_IMAGE_MODEL, MOCK_PROBABILITIES, MOCK_SPEECH_MODEL, TestApp, TestModels,
};

fn assert_sorted_descending(predictions: &[Value]) {
    let confidences: Vec<f64> = predictions
        .iter()
        .map(|p| p["confidence"].as_f64().unwrap())
        .collect();
    assert!(
        confidences.windows(2).all(|w| w[0] >= w[1]),
        "predictions not sorted: {confidences:?}"
    );
}

#[tokio::test]
async fn silent_audio_returns_transcription() {
    let app = TestApp::spawn().await;

    let resp = app
        .analyze(silent_wav(1), "silence.wav", "audio/wav", "audio", "anything?")
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["file_type"], "audio");
    assert_eq!(json["filename"], "silence.wav");
    assert_eq!(json["message"], "anything?");
    assert!(json["analysis"]["transcription"].is_string());
    assert_eq!(json["analysis"]["transcription"], "");
    assert_eq!(json["analysis"]["model_used"], MOCK_SPEECH_MODEL);
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn garbage_image_is_internal_error() {
    let app = TestApp::spawn().await;

    let resp = app
        .analyze(garbage(), "photo.jpg", "image/jpeg", "image", "")
        .await;

    assert_eq!(resp.status().as_u16(), 500);
    let json: Value = resp.json().await.unwrap();
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.starts_with("Internal error:"), "detail was {detail}");
}

#[tokio::test]
async fn pdf_is_reported_unsupported() {
    let app = TestApp::spawn().await;

    let resp = app
        .analyze(b"%PDF-1.7\n".to_vec(), "report.pdf", "application/pdf", "pdf", "read this")
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["file_type"], "pdf");
    assert_eq!(json["filename"], "report.pdf");
    assert_eq!(json["message"], "read this");
    assert_eq!(json["analysis"]["status"], "unsupported type");
    assert!(json["analysis"]["note"].is_string());
}

#[tokio::test]
async fn modality_tag_is_case_sensitive() {
    let app = TestApp::spawn().await;

    let resp = app.analyze(png(32, 32), "a.png", "image/png", "Image", "").await;

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["analysis"]["status"], "unsupported type");
}

#[tokio::test]
async fn image_is_classified_and_ranked() {
    let app = TestApp::spawn().await;

    let resp = app
        .analyze(png(640, 480), "skin.png", "image/png", "image", "")
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    let analysis = &json["analysis"];
    assert_eq!(analysis["predicted_class"], "melanoma");
    assert!((analysis["confidence"].as_f64().unwrap() - 0.6).abs() < 1e-6);
    assert_eq!(analysis["model_used"], MOCK_IMAGE_MODEL);
    assert!(analysis.get("frames_analyzed").is_none());

    let predictions = analysis["all_predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), MOCK_PROBABILITIES.len());
    assert_eq!(predictions[0]["class"], "melanoma");
    assert_eq!(predictions[1]["class"], "dermatitis");
    assert_sorted_descending(predictions);
}

#[tokio::test]
async fn multi_frame_video_averages_every_frame() {
    let app = TestApp::spawn().await;

    let resp = app
        .analyze(animated_gif(10), "clip.gif", "image/gif", "video", "")
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    let analysis = &json["analysis"];
    assert_eq!(analysis["frames_analyzed"], 10);
    assert_eq!(analysis["predicted_class"], "melanoma");

    let predictions = analysis["all_predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 8);
    assert_sorted_descending(predictions);
}

#[tokio::test]
async fn single_frame_video_omits_frame_count() {
    let app = TestApp::spawn_with_settings(|s| {
        s.analysis.video.policy = "single_frame".to_string();
    })
    .await;

    let resp = app
        .analyze(animated_gif(5), "clip.gif", "image/gif", "video", "")
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert!(json["analysis"].get("frames_analyzed").is_none());
    assert_eq!(json["analysis"]["predicted_class"], "melanoma");
}

#[tokio::test]
async fn unreadable_video_is_rejected_with_envelope() {
    for policy in ["single_frame", "multi_frame"] {
        let app = TestApp::spawn_with_settings(|s| {
            s.analysis.video.policy = policy.to_string();
        })
        .await;

        let resp = app
            .analyze(garbage(), "broken.gif", "image/gif", "video", "what is this?")
            .await;

        assert_eq!(resp.status().as_u16(), 400, "policy {policy}");
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["file_type"], "video");
        assert_eq!(json["filename"], "broken.gif");
        assert_eq!(json["message"], "what is this?");
        assert_eq!(json["analysis"]["status"], "no frame decodable");
        assert!(json["error"].is_string());
        assert!(json.get("detail").is_none());
    }
}

#[tokio::test]
async fn audio_without_model_is_unavailable() {
    let models = TestModels {
        speech: None,
        ..TestModels::default()
    };
    let app = TestApp::spawn_with(models, |_| {}).await;

    let resp = app
        .analyze(silent_wav(1), "silence.wav", "audio/wav", "audio", "")
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["analysis"]["status"], "analysis unavailable");
}

#[tokio::test]
async fn missing_file_type_is_bad_request() {
    let app = TestApp::spawn().await;

    let file_part = multipart::Part::bytes(png(8, 8))
        .file_name("a.png")
        .mime_str("image/png")
        .unwrap();
    let form = multipart::Form::new().part("file", file_part);

    let resp = app.analyze_form(form).await;

    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert!(json["detail"].as_str().unwrap().contains("file_type"));
}

#[tokio::test]
async fn missing_file_is_bad_request() {
    let app = TestApp::spawn().await;

    let form = multipart::Form::new().text("file_type", "image");

    let resp = app.analyze_form(form).await;

    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert!(json["detail"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn slow_model_times_out() {
    let slow = MockImageModel::from_fn("slow.onnx", |_| {
        std::thread::sleep(std::time::Duration::from_millis(2500));
        MOCK_PROBABILITIES.to_vec()
    });
    let models = TestModels {
        image: Some(Arc::new(slow)),
        ..TestModels::default()
    };
    let app = TestApp::spawn_with(models, |s| {
        s.analysis.request_timeout_secs = Some(1);
    })
    .await;

    let resp = app.analyze(png(16, 16), "a.png", "image/png", "image", "").await;

    assert_eq!(resp.status().as_u16(), 504);
    let json: Value = resp.json().await.unwrap();
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn concurrent_uploads_keep_their_own_envelopes() {
    let app = TestApp::spawn().await;

    let requests = (0..6).map(|i| {
        let app = &app;
        async move {
            let (bytes, name, mime, tag) = if i % 2 == 0 {
                (png(64, 64), format!("img{i}.png"), "image/png", "image")
            } else {
                (silent_wav(1), format!("snd{i}.wav"), "audio/wav", "audio")
            };
            let resp = app.analyze(bytes, &name, mime, tag, &format!("msg{i}")).await;
            (i, resp.json::<Value>().await.unwrap())
        }
    });

    for (i, json) in futures::future::join_all(requests).await {
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], format!("msg{i}"));
        if i % 2 == 0 {
            assert_eq!(json["analysis"]["predicted_class"], "melanoma");
        } else {
            assert_eq!(json["analysis"]["transcription"], "");
        }
    }
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "trace-me-42")
        .send()
        .await
        .unwrap();

    assert_eq!(
        resp.headers().get("x-request-id").unwrap().to_str().unwrap(),
        "trace-me-42"
    );
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();

    let id = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok(), "request id was {id}");
}
