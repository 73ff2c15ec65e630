// src/data/mod.rs
//! GPU-side data for the viewer.
//!
//! - Uploading the immutable star instance buffer.
//! - Uniform and sprite layouts shared with the WGSL programs.

pub mod star_cloud;
pub mod types;

pub use self::types::{FlowUniforms, StarCloudGpu};
