use std::net::SocketAddr;
use std::sync::Arc;

use mediascan_analysis::AnalysisEngine;
use mediascan_analysis::model::mock::{MockImageModel, MockSpeechModel};
use mediascan_analysis::model::{ImageModel, SpeechModel};
use mediascan_analysis::pipeline::pipelines_with_models;
use mediascan_api::{build_router, state::{AppState, analysis_config}};
use mediascan_config::Settings;
use reqwest::multipart;
use tokio::net::TcpListener;

/// Scores returned by the default mock classifier, in label order.
/// The top class is `melanoma` (index 5).
pub const MOCK_PROBABILITIES: [f32; 8] = [0.02, 0.08, 0.05, 0.1, 0.05, 0.6, 0.05, 0.05];

pub const MOCK_IMAGE_MODEL: &str = "mock_classifier.onnx";
pub const MOCK_SPEECH_MODEL: &str = "mock_ctc.onnx";

/// Models wired into a test server. `None` leaves the modality unconfigured.
pub struct TestModels {
    pub image: Option<Arc<dyn ImageModel>>,
    pub speech: Option<Arc<dyn SpeechModel>>,
}

impl Default for TestModels {
    fn default() -> Self {
        Self {
            image: Some(Arc::new(MockImageModel::fixed(
                MOCK_IMAGE_MODEL,
                MOCK_PROBABILITIES.to_vec(),
            ))),
            // 31 characters + OOV + blank, matching the default vocabulary
            speech: Some(Arc::new(MockSpeechModel::silent(MOCK_SPEECH_MODEL, 32))),
        }
    }
}

/// A running test application backed by in-memory models.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub settings: Settings,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a test server with mock models and the multi-frame video policy.
    pub async fn spawn() -> Self {
        Self::spawn_with(TestModels::default(), |_| {}).await
    }

    /// Spawn a test server with customized settings.
    ///
    /// The `mutator` closure receives a `&mut Settings` after defaults are applied.
    pub async fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        Self::spawn_with(TestModels::default(), mutator).await
    }

    pub async fn spawn_with(models: TestModels, mutator: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = Settings::load().expect("Failed to load settings");
        settings.analysis.video.policy = "multi_frame".to_string();
        settings.analysis.request_timeout_secs = None;
        mutator(&mut settings);

        let config = analysis_config(&settings).expect("Invalid analysis settings");
        let pipelines = pipelines_with_models(&config, models.image, models.speech);
        let engine = AnalysisEngine::new(pipelines, config.request_timeout());

        let app_state = AppState::with_engine(settings.clone(), engine);
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url,
            settings,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs a single file to `/analyze`.
    pub async fn analyze(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime: &str,
        file_type: &str,
        message: &str,
    ) -> reqwest::Response {
        let file_part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .unwrap();

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("file_type", file_type.to_string())
            .text("message", message.to_string());

        self.analyze_form(form).await
    }

    pub async fn analyze_form(&self, form: multipart::Form) -> reqwest::Response {
        self.client
            .post(self.url("/analyze"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}
