//! Generation orchestration.
//!
//! The engine holds one pipeline instance for the life of the process and
//! turns prompts into mesh files on disk. When the pipeline cannot be
//! loaded (no weights installed), the engine degrades to mock mode and
//! echoes requests back instead of failing.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::device::Device;
use crate::engine::shap_e::{PipelineParams, ShapEPipeline};
use crate::mesh::ply;

/// URL prefix under which generated files are served.
pub const STATIC_PREFIX: &str = "/static";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Generation task failed: {0}")]
    Task(String),
}

/// Result of a single generation request.
///
/// Exactly one of the three shapes is populated. A success carries the file
/// reference; a failure carries only `error`; a mock result echoes the
/// prompt. Absent fields are omitted from the serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationOutcome {
    /// A completed generation pointing at the exported file.
    pub fn success(prompt: &str, filename: &str) -> Self {
        Self {
            status: Some("success".to_string()),
            model_url: Some(format!("{STATIC_PREFIX}/{filename}")),
            filename: Some(filename.to_string()),
            message: Some(format!("Generated model for '{prompt}'")),
            prompt: None,
            error: None,
        }
    }

    /// A mock result returned when no pipeline is loaded.
    pub fn mocked(prompt: &str) -> Self {
        Self {
            status: Some("mocked".to_string()),
            model_url: None,
            filename: None,
            message: None,
            prompt: Some(prompt.to_string()),
            error: None,
        }
    }

    /// A failed generation. Only the error string crosses the API boundary.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            status: None,
            model_url: None,
            filename: None,
            message: None,
            prompt: None,
            error: Some(error.to_string()),
        }
    }

    /// Label used for metrics.
    pub fn status_label(&self) -> &str {
        if self.error.is_some() {
            "error"
        } else {
            self.status.as_deref().unwrap_or("unknown")
        }
    }
}

/// The generation engine. One instance serves all requests.
pub struct AiEngine {
    pipeline: Option<Arc<ShapEPipeline>>,
    config: Arc<Config>,
}

impl AiEngine {
    /// Create the engine, loading the pipeline once.
    ///
    /// A missing weights directory is not fatal: the engine degrades to
    /// mock mode and the server keeps answering.
    pub fn new(config: Arc<Config>) -> Self {
        let device = Device::detect();
        info!(
            device = %device,
            accelerated = device.is_accelerator(),
            "Selected compute device"
        );

        let params = PipelineParams {
            use_fp16: config.pipeline.use_fp16,
            cpu_offload: config.pipeline.cpu_offload,
            frame_size: config.pipeline.frame_size,
        };

        let pipeline = match ShapEPipeline::load(&config.pipeline.weights_dir, device, params) {
            Ok(pipeline) => Some(Arc::new(pipeline)),
            Err(e) => {
                warn!(error = %e, "Pipeline unavailable, running in mock mode");
                None
            }
        };

        Self { pipeline, config }
    }

    /// Whether the engine is running without a real pipeline.
    pub fn is_mock(&self) -> bool {
        self.pipeline.is_none()
    }

    /// Generate a mesh for `prompt` and write it under the output directory.
    ///
    /// Pipeline and export failures are folded into the returned outcome;
    /// only a failure of the blocking task itself surfaces as an error.
    pub async fn generate(
        &self,
        prompt: &str,
        steps: u32,
        guidance: f32,
    ) -> Result<GenerationOutcome, EngineError> {
        let Some(pipeline) = self.pipeline.clone() else {
            info!(prompt, "No pipeline loaded, returning mock result");
            return Ok(GenerationOutcome::mocked(prompt));
        };

        let started = Instant::now();
        let owned_prompt = prompt.to_string();
        let decoded = tokio::task::spawn_blocking(move || {
            let latent = pipeline.sample_latents(&owned_prompt, steps, guidance)?;
            pipeline.decode_latent(&latent)
        })
        .await
        .map_err(|e| EngineError::Task(e.to_string()))?;

        let mesh = match decoded {
            Ok(mesh) => mesh,
            Err(e) => {
                error!(error = %e, "Generation failed");
                return Ok(GenerationOutcome::failed(e));
            }
        };

        let filename = format!("{}.ply", Uuid::new_v4());
        let path = self.config.generation.output_dir.join(&filename);
        if let Err(e) = ply::write_mesh(&path, &mesh).await {
            error!(error = %e, "Mesh export failed");
            return Ok(GenerationOutcome::failed(e));
        }

        info!(
            filename,
            vertices = mesh.vertex_count(),
            faces = mesh.triangle_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Mesh generated"
        );

        Ok(GenerationOutcome::success(prompt, &filename))
    }
}
