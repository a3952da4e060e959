//! boundmap - Reproject British National Grid boundaries for web maps and track hover state

pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod hover;
pub mod layers;
pub mod logging;
pub mod renderer;
pub mod session;

pub use error::{Error, Result};
