//! CPU side of the renderer: shading constants, per-frame transform
//! composition and GPU buffer layouts. Device and swap-chain setup live with
//! the consumer of this data.

pub mod builder;
pub mod constants;
pub mod vertex;

pub use builder::SceneTransformBuilder;
pub use constants::ShadingConstants;
pub use vertex::{GpuVertex, ModelBuffers, PartDraw};
