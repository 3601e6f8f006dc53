//! Core engine types and utilities for Petri.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform (translation, scale, rotation) and model matrix composition
//! - Frame delta timing and the countdown clock

pub mod time;
pub mod transform;

pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
