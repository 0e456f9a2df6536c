//! Mesh representation and export.
//!
//! - [`geometry`]: Indexed triangle mesh container
//! - [`ply`]: Binary PLY serialization

pub mod geometry;
pub mod ply;
