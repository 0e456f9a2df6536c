//! HTTP API for text-to-3D generation.
//!
//! Implements the routes the frontend drives:
//! - GET /
//! - POST /generate
//! - POST /generate-image
//! - GET /metrics
//! - GET /static/{filename}

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::engine::generator::{AiEngine, GenerationOutcome, STATIC_PREFIX};
use crate::server::error::ApiError;
use crate::server::metrics;

/// Application state shared across handlers.
pub struct AppState {
    pub engine: AiEngine,
    pub config: Arc<Config>,
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/generate", post(generate))
        .route("/generate-image", post(generate_image))
        .route("/metrics", get(serve_metrics))
        .nest_service(
            STATIC_PREFIX,
            ServeDir::new(&state.config.generation.output_dir),
        )
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// Text-to-3D generation request. Omitted knobs fall back to the
/// configured defaults.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub guidance: Option<f32>,
}

/// Generation response wrapping the engine outcome.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub result: GenerationOutcome,
}

/// Health probe response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Image upload acknowledgement. Image-conditioned generation is not
/// wired up, so this endpoint only echoes what it received.
#[derive(Debug, Serialize)]
pub struct ImageMockResponse {
    pub status: &'static str,
    pub front_image: String,
    pub back_image: Option<String>,
    pub message: &'static str,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        message: "Fast3dPrint Backend is running with Shap-E",
    })
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let steps = req.steps.unwrap_or(state.config.generation.default_steps);
    let guidance = req
        .guidance
        .unwrap_or(state.config.generation.default_guidance);

    info!(
        prompt = req.prompt,
        steps = steps,
        guidance = guidance,
        "Generation request"
    );

    let started = Instant::now();
    let result = match state.engine.generate(&req.prompt, steps, guidance).await {
        Ok(result) => result,
        Err(e) => {
            // Failed tasks never produce an outcome, so they are counted
            // here before the error leaves the handler.
            metrics::record_generation("task_error", started.elapsed().as_secs_f64());
            return Err(ApiError::Internal(e.to_string()));
        }
    };

    metrics::record_generation(result.status_label(), started.elapsed().as_secs_f64());

    Ok(Json(GenerateResponse { result }))
}

async fn generate_image(mut multipart: Multipart) -> Result<Json<ImageMockResponse>, ApiError> {
    let mut front_image = None;
    let mut back_image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

        info!(
            field = name,
            filename = filename,
            size = bytes.len(),
            "Received image"
        );

        match name.as_str() {
            "front_image" => front_image = Some(filename),
            "back_image" => back_image = Some(filename),
            _ => {}
        }
    }

    let front_image =
        front_image.ok_or_else(|| ApiError::BadRequest("front_image is required".to_string()))?;

    Ok(Json(ImageMockResponse {
        status: "success",
        front_image,
        back_image,
        message: "Images received. 3D generation mockup.",
    }))
}

async fn serve_metrics() -> String {
    metrics::get_metrics()
}
