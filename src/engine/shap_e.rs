//! Interface to the Shap-E text-to-3D diffusion pipeline.
//!
//! This module defines the typed surface of the native diffusion runtime.
//! The actual linking is handled by build.rs which builds the runtime with
//! optional CUDA support.
//!
//! For the initial implementation, we use a mock/stub that simulates the
//! pipeline's behavior for integration testing without requiring the native
//! library: latent sampling is a deterministic function of the prompt, and
//! decoding shapes a closed surface from the latent field.

use std::f32::consts::{PI, TAU};
use std::path::{Path, PathBuf};

use glam::Vec3;
use half::f16;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::device::Device;
use crate::mesh::geometry::TriMesh;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Shap-E weights not found: {0}")]
    WeightsNotFound(String),

    #[error("Failed to load pipeline: {0}")]
    LoadFailed(String),

    #[error("Latent sampling failed: {0}")]
    SamplingFailed(String),

    #[error("Latent decoding failed: {0}")]
    DecodeFailed(String),
}

/// Width of the stub latent vector.
///
/// The real prior emits 1024x1024 latents for the transmitter; the stub
/// keeps a vector just wide enough to drive mesh decoding.
pub const LATENT_WIDTH: usize = 4096;

/// Pipeline load options (mirrors the diffusers `ShapEPipeline` knobs).
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Load weights in half precision.
    pub use_fp16: bool,

    /// Offload submodules to host memory between denoising steps.
    pub cpu_offload: bool,

    /// Render resolution used when decoding latents to geometry.
    pub frame_size: u32,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            use_fp16: true,
            cpu_offload: false,
            frame_size: 256,
        }
    }
}

/// Stub pipeline handle.
///
/// In a real implementation, this would hold the text encoder, the diffusion
/// prior and the transmitter loaded onto the selected device.
pub struct ShapEPipeline {
    /// Directory the weights were loaded from.
    pub weights_dir: PathBuf,

    /// Device the pipeline runs on.
    pub device: Device,

    /// Load options.
    pub params: PipelineParams,
}

impl ShapEPipeline {
    /// Load the pipeline from a weights directory (stub).
    ///
    /// In a real implementation, this deserializes the text encoder, prior
    /// and transmitter checkpoints onto the device, in half precision when
    /// requested.
    pub fn load(
        weights_dir: &Path,
        device: Device,
        params: PipelineParams,
    ) -> Result<Self, PipelineError> {
        if !weights_dir.exists() {
            return Err(PipelineError::WeightsNotFound(
                weights_dir.display().to_string(),
            ));
        }

        info!(
            weights = %weights_dir.display(),
            device = %device,
            fp16 = params.use_fp16,
            cpu_offload = params.cpu_offload,
            "Loaded Shap-E pipeline"
        );

        Ok(Self {
            weights_dir: weights_dir.to_path_buf(),
            device,
            params,
        })
    }

    /// Run the diffusion prior for `steps` iterations (stub).
    ///
    /// In a real implementation, this encodes the prompt and denoises a
    /// latent under classifier-free guidance. The stub derives a
    /// deterministic latent from the prompt so identical requests reproduce
    /// identical geometry.
    pub fn sample_latents(
        &self,
        prompt: &str,
        steps: u32,
        guidance: f32,
    ) -> Result<Vec<f32>, PipelineError> {
        if steps == 0 {
            return Err(PipelineError::SamplingFailed(
                "diffusion requires at least one step".to_string(),
            ));
        }

        let mut cond = LatentRng::seeded(prompt);
        let mut uncond = LatentRng::seeded("");
        let mut latent = vec![0.0f32; LATENT_WIDTH];

        for _ in 0..steps {
            for value in latent.iter_mut() {
                // Classifier-free guidance: push the conditional update away
                // from the unconditional one.
                let c = cond.next_unit();
                let u = uncond.next_unit();
                *value += u + guidance * (c - u);

                if self.params.use_fp16 {
                    *value = f16::from_f32(*value).to_f32();
                }
            }
        }

        // Average over steps, then squash so downstream decoding sees
        // transmitter-range activations in (-1, 1).
        let scale = 1.0 / steps as f32;
        for value in latent.iter_mut() {
            let v = *value * scale;
            *value = v / (1.0 + v.abs());
        }

        debug!(prompt_len = prompt.len(), steps, guidance, "Sampled latents");

        Ok(latent)
    }

    /// Decode a latent vector into a triangle mesh (stub).
    ///
    /// In a real implementation, the transmitter turns the latent into a
    /// neural field that gets marched into triangles. The stub shapes a UV
    /// sphere by the latent instead: radial displacement for form, extra
    /// field channels for vertex color.
    pub fn decode_latent(&self, latent: &[f32]) -> Result<TriMesh, PipelineError> {
        if latent.is_empty() {
            return Err(PipelineError::DecodeFailed("empty latent".to_string()));
        }

        let segments = (self.params.frame_size / 8).clamp(12, 64);
        let rings = (segments / 2).max(6);
        let stride = segments + 1;

        let mut mesh = TriMesh::default();

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let phi = PI * v;

            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let theta = TAU * u;

                let unit = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());

                // Duplicated seam and pole vertices must sample the same
                // field value as their twins or the surface cracks open.
                let mut su = if segment == segments { 0.0 } else { u };
                if ring == 0 || ring == rings {
                    su = 0.0;
                }

                let displacement = 0.35 * latent_field(latent, su, v, 0);
                mesh.positions.push(unit * (1.0 + displacement));
                mesh.colors.push([
                    channel_byte(latent_field(latent, su, v, 1)),
                    channel_byte(latent_field(latent, su, v, 2)),
                    channel_byte(latent_field(latent, su, v, 3)),
                ]);
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let i0 = ring * stride + segment;
                let i1 = i0 + 1;
                let i2 = i0 + stride;
                let i3 = i2 + 1;

                if ring == 0 {
                    mesh.indices.push([i0, i2, i3]);
                } else if ring == rings - 1 {
                    mesh.indices.push([i0, i2, i1]);
                } else {
                    mesh.indices.push([i0, i2, i3]);
                    mesh.indices.push([i0, i3, i1]);
                }
            }
        }

        mesh.recompute_normals();

        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.triangle_count(),
            "Decoded latent to mesh"
        );

        Ok(mesh)
    }
}

/// Deterministic generator standing in for the denoising noise schedule.
struct LatentRng {
    state: u64,
}

impl LatentRng {
    fn seeded(prompt: &str) -> Self {
        use std::hash::{DefaultHasher, Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        prompt.hash(&mut hasher);
        Self {
            state: hasher.finish(),
        }
    }

    /// Next value in [-1, 1).
    fn next_unit(&mut self) -> f32 {
        // Knuth's MMIX LCG constants.
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let bits = (self.state >> 40) as u32;
        (bits as f32 / 16_777_216.0) * 2.0 - 1.0
    }
}

/// Smoothed lookup into the latent treated as a square grid.
///
/// Bilinear interpolation with the classic fade curve, so neighboring
/// surface points see a continuous field rather than raw latent noise.
fn latent_field(latent: &[f32], u: f32, v: f32, channel: usize) -> f32 {
    let side = ((latent.len() as f32).sqrt() as usize).max(2);
    let cells = side - 1;

    let x = u.clamp(0.0, 1.0) * cells as f32;
    let y = v.clamp(0.0, 1.0) * cells as f32;
    let xi = (x.floor() as usize).min(cells.saturating_sub(1));
    let yi = (y.floor() as usize).min(cells.saturating_sub(1));
    let tx = fade(x - xi as f32);
    let ty = fade(y - yi as f32);

    let offset = channel * 17;
    let sample = |xs: usize, ys: usize| latent[(ys * side + xs + offset) % latent.len()];

    let a = lerp(sample(xi, yi), sample(xi + 1, yi), tx);
    let b = lerp(sample(xi, yi + 1), sample(xi + 1, yi + 1), tx);
    lerp(a, b, ty)
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

fn channel_byte(value: f32) -> u8 {
    (((value.clamp(-1.0, 1.0) + 1.0) * 0.5) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_pipeline(params: PipelineParams) -> (ShapEPipeline, TempDir) {
        let tmp = TempDir::new().unwrap();
        let pipeline = ShapEPipeline::load(tmp.path(), Device::Cpu, params).unwrap();
        (pipeline, tmp)
    }

    #[test]
    fn test_load_missing_weights() {
        let result = ShapEPipeline::load(
            Path::new("/nonexistent/shap-e"),
            Device::Cpu,
            PipelineParams::default(),
        );
        assert!(matches!(result, Err(PipelineError::WeightsNotFound(_))));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let (pipeline, _tmp) = test_pipeline(PipelineParams::default());
        let result = pipeline.sample_latents("a chair", 0, 15.0);
        assert!(matches!(result, Err(PipelineError::SamplingFailed(_))));
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let (pipeline, _tmp) = test_pipeline(PipelineParams::default());

        let first = pipeline.sample_latents("a wooden chair", 8, 15.0).unwrap();
        let second = pipeline.sample_latents("a wooden chair", 8, 15.0).unwrap();
        assert_eq!(first, second);

        let other = pipeline.sample_latents("a ceramic mug", 8, 15.0).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_fp16_changes_latents() {
        let (full, _tmp_a) = test_pipeline(PipelineParams {
            use_fp16: false,
            ..PipelineParams::default()
        });
        let (half, _tmp_b) = test_pipeline(PipelineParams::default());

        let fp32 = full.sample_latents("a chair", 8, 15.0).unwrap();
        let fp16 = half.sample_latents("a chair", 8, 15.0).unwrap();
        assert_ne!(fp32, fp16);
    }

    #[test]
    fn test_latents_are_bounded() {
        let (pipeline, _tmp) = test_pipeline(PipelineParams::default());
        let latent = pipeline.sample_latents("a chair", 16, 30.0).unwrap();
        assert_eq!(latent.len(), LATENT_WIDTH);
        assert!(latent.iter().all(|v| v.abs() < 1.0));
    }

    #[test]
    fn test_decode_counts() {
        let (pipeline, _tmp) = test_pipeline(PipelineParams::default());
        let latent = pipeline.sample_latents("a chair", 4, 15.0).unwrap();
        let mesh = pipeline.decode_latent(&latent).unwrap();

        // frame_size 256 -> 32 segments, 16 rings.
        let segments = 32u32;
        let rings = 16u32;
        assert_eq!(
            mesh.vertex_count() as u32,
            (rings + 1) * (segments + 1)
        );
        assert_eq!(
            mesh.triangle_count() as u32,
            segments * (2 * rings - 2)
        );
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
        assert_eq!(mesh.colors.len(), mesh.vertex_count());
    }

    #[test]
    fn test_decode_empty_latent() {
        let (pipeline, _tmp) = test_pipeline(PipelineParams::default());
        let result = pipeline.decode_latent(&[]);
        assert!(matches!(result, Err(PipelineError::DecodeFailed(_))));
    }

    #[test]
    fn test_decode_surface_is_closed_at_seam() {
        let (pipeline, _tmp) = test_pipeline(PipelineParams::default());
        let latent = pipeline.sample_latents("a chair", 4, 15.0).unwrap();
        let mesh = pipeline.decode_latent(&latent).unwrap();

        let segments = 32usize;
        let stride = segments + 1;
        for ring in 0..=16usize {
            let first = mesh.positions[ring * stride];
            let last = mesh.positions[ring * stride + segments];
            assert!((first - last).length() < 1e-3);
        }
    }

    #[test]
    fn test_decode_normals_follow_displaced_surface() {
        let (pipeline, _tmp) = test_pipeline(PipelineParams::default());
        let latent = pipeline.sample_latents("a chair", 4, 15.0).unwrap();
        let mesh = pipeline.decode_latent(&latent).unwrap();

        assert_eq!(mesh.normals.len(), mesh.vertex_count());

        let mut referenced = vec![false; mesh.vertex_count()];
        for tri in &mesh.indices {
            for &i in tri {
                referenced[i as usize] = true;
            }
        }

        // Normals come from the displaced faces, not the raw unit sphere:
        // every referenced vertex carries a unit normal, and the field
        // gradient tilts at least one of them off the radial direction.
        let mut min_radial_dot = f32::MAX;
        for (i, normal) in mesh.normals.iter().enumerate() {
            if !referenced[i] {
                continue;
            }
            assert!((normal.length() - 1.0).abs() < 1e-3);
            let radial = mesh.positions[i].normalize_or_zero();
            min_radial_dot = min_radial_dot.min(normal.dot(radial));
        }
        assert!(min_radial_dot < 0.999);
    }

    #[test]
    fn test_displacement_stays_bounded() {
        let (pipeline, _tmp) = test_pipeline(PipelineParams::default());
        let latent = pipeline.sample_latents("a chair", 4, 15.0).unwrap();
        let mesh = pipeline.decode_latent(&latent).unwrap();

        for position in &mesh.positions {
            let radius = position.length();
            assert!(radius > 0.6 && radius < 1.4, "radius {radius} out of band");
        }
    }
}
