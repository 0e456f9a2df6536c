//! Runtime configuration for fast3d-print.
//!
//! Configuration is loaded from a JSON file or constructed programmatically.
//! Missing sections and fields fall back to the built-in defaults.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "fast3d-print", about = "Text-to-3D generation server")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Generation request defaults and output location.
    pub generation: GenerationConfig,

    /// Diffusion pipeline settings.
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            generation: GenerationConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8000").
    pub listen: String,

    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024, // 20 MB
        }
    }
}

/// Generation defaults and output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Directory where generated PLY files are written.
    pub output_dir: PathBuf,

    /// Diffusion steps used when a request omits them.
    pub default_steps: u32,

    /// Classifier-free guidance scale used when a request omits it.
    pub default_guidance: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated_models"),
            default_steps: 64,
            default_guidance: 15.0,
        }
    }
}

/// Diffusion pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the Shap-E weight files.
    pub weights_dir: PathBuf,

    /// Run the samplers in half precision to cut memory use.
    pub use_fp16: bool,

    /// Keep weights on host RAM and stream them to the device per stage.
    pub cpu_offload: bool,

    /// Rendering frame size, controls decoded mesh resolution.
    pub frame_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights_dir: PathBuf::from("weights/shap-e"),
            use_fp16: true,
            cpu_offload: false,
            frame_size: 256,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.server.listen, "0.0.0.0:8000");
        assert_eq!(cfg.generation.default_steps, 64);
        assert!(cfg.pipeline.use_fp16);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = Config::load(std::path::Path::new("/nonexistent/config.json")).unwrap();
        assert_eq!(cfg.generation.default_guidance, 15.0);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"generation": {"default_steps": 8}}"#).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.generation.default_steps, 8);
        assert_eq!(cfg.generation.default_guidance, 15.0);
        assert_eq!(cfg.server.listen, "0.0.0.0:8000");
    }
}
