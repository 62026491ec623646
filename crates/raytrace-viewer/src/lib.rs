// src/lib.rs
//! Real-time GPU ray tracing viewer library.
//!
//! A compute kernel traces a supersampled colour and depth target every frame;
//! a screen pass resolves the colour target through its mip chain (or shows
//! depth). A first-person controller keeps the GPU camera record in step with
//! keyboard and mouse input.

pub mod app;
pub mod camera;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod renderer;
pub mod scene;
pub mod session;
pub mod shaders;
pub mod ui;
