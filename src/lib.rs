//! fast3d-print: text-to-3D generation service.
//!
//! Wraps the Shap-E text-to-3D diffusion pipeline behind a small HTTP API,
//! exporting generated meshes as binary PLY files served back over HTTP.
//!
//! - [`config`]: CLI and JSON configuration
//! - [`engine`]: device selection, diffusion pipeline, generation orchestration
//! - [`mesh`]: triangle mesh container and PLY export
//! - [`server`]: axum routes, error mapping, metrics

pub mod config;
pub mod engine;
pub mod mesh;
pub mod server;
