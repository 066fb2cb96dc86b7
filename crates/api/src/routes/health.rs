use axum::{Json, extract::State};
use mediascan_analysis::Modality;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let modalities: Vec<&str> = [Modality::Image, Modality::Video, Modality::Audio]
        .into_iter()
        .filter(|m| state.engine.supports(*m))
        .map(|m| m.as_str())
        .collect();

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "modalities": modalities,
    }))
}
