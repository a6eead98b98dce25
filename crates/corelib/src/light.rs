//! Light and overlay colors as edited (8-bit channels).

use crate::{Vec3, Vec4};

/// 8-bit-per-channel color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::opaque(255, 255, 255);
    pub const BLACK: Rgba8 = Rgba8::opaque(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Channel-wise `component / 255`.
    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            f32::from(self.r),
            f32::from(self.g),
            f32::from(self.b),
            f32::from(self.a),
        ) / 255.0
    }
}

/// Single point light plus ambient term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightState {
    pub enabled: bool,
    pub position: Vec3,
    pub color: Rgba8,
    pub ambient: Rgba8,
    pub diffuse_intensity: f32,
    pub specular_intensity: f32,
    pub shininess: f32,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            enabled: true,
            position: Vec3::new(2.0, 4.0, 4.0),
            color: Rgba8::WHITE,
            ambient: Rgba8::opaque(51, 51, 51),
            diffuse_intensity: 1.0,
            specular_intensity: 0.5,
            shininess: 32.0,
        }
    }
}

/// Colors of the editor overlay lines drawn with the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayColors {
    pub grid: Rgba8,
    pub axis_x: Rgba8,
    pub axis_y: Rgba8,
    pub axis_z: Rgba8,
}

impl Default for OverlayColors {
    fn default() -> Self {
        Self {
            grid: Rgba8::new(128, 128, 128, 255),
            axis_x: Rgba8::opaque(255, 0, 0),
            axis_y: Rgba8::opaque(0, 255, 0),
            axis_z: Rgba8::opaque(0, 0, 255),
        }
    }
}
