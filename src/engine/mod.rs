//! Text-to-3D generation engine.
//!
//! - [`device`]: Compute device detection and selection
//! - [`generator`]: High-level generation orchestrator
//! - [`shap_e`]: Interface to the Shap-E diffusion pipeline

pub mod device;
pub mod generator;
pub mod shap_e;
