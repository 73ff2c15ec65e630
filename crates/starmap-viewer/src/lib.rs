//! GPU viewer for the star map visualisers.
//!
//! Hosts the [`starmap`] core in a winit window: uploads the render buffers
//! once, feeds per-frame uniforms to the WGSL point program, translates
//! window input into the interaction controller and draws the egui HUD.

pub mod app;
pub mod camera;
pub mod config;
pub mod data;
pub mod renderer;
pub mod ui;
