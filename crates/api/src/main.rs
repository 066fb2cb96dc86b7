use mediascan_api::{build_router, state::AppState};
use mediascan_config::Settings;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "mediascan_api=debug,mediascan_analysis=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let settings = Settings::load()?;
    info!("Starting MediaScan API on {}:{}", settings.app.host, settings.app.port);
    info!(
        image_model = ?settings.analysis.image.model_path,
        audio_model = ?settings.analysis.audio.model_path,
        pixel_convention = %settings.analysis.image.pixel_convention,
        video_policy = %settings.analysis.video.policy,
        timeout_secs = ?settings.analysis.request_timeout_secs,
        "Analysis config"
    );

    // Load models; blocks until every configured weight file is in memory
    let app_state = AppState::new(settings.clone())?;

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
