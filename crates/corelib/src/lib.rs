//! Core types: math re-exports, layer transform, camera, lighting, errors.

pub use glam::{Mat4, Vec3, Vec4, vec3};

pub mod camera;
pub mod light;
pub mod transform;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown coordinate system '{0}' (expected rh-yup, rh-zup, lh-yup or lh-zup)")]
    UnknownCoordinateSystem(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
