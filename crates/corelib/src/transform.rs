//! Per-layer placement state and the authoring-convention table.

use std::{fmt, str::FromStr};

use crate::{CoreError, Mat4, Vec3};

/// Handedness and up axis a mesh was authored in.
///
/// The renderer works in right-handed Y-up space; every other convention is
/// reconciled through [`CoordinateSystem::axis_conversion`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CoordinateSystem {
    #[default]
    RightHandedYUp,
    RightHandedZUp,
    LeftHandedYUp,
    LeftHandedZUp,
}

impl CoordinateSystem {
    pub const ALL: [CoordinateSystem; 4] = [
        CoordinateSystem::RightHandedYUp,
        CoordinateSystem::RightHandedZUp,
        CoordinateSystem::LeftHandedYUp,
        CoordinateSystem::LeftHandedZUp,
    ];

    /// Corrective matrix taking source coordinates into renderer space.
    ///
    /// Negating Z flips triangle winding; consumers rendering left-handed
    /// sources must swap their front-face setting accordingly.
    pub fn axis_conversion(self) -> Mat4 {
        let negate_z = Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0));
        let z_up_to_y_up = Mat4::from_rotation_x(-90f32.to_radians());
        match self {
            CoordinateSystem::RightHandedYUp => Mat4::IDENTITY,
            CoordinateSystem::RightHandedZUp => z_up_to_y_up,
            CoordinateSystem::LeftHandedYUp => negate_z,
            CoordinateSystem::LeftHandedZUp => negate_z * z_up_to_y_up,
        }
    }

    /// Whether the conversion mirrors geometry (and therefore winding).
    pub fn is_left_handed(self) -> bool {
        matches!(
            self,
            CoordinateSystem::LeftHandedYUp | CoordinateSystem::LeftHandedZUp
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoordinateSystem::RightHandedYUp => "rh-yup",
            CoordinateSystem::RightHandedZUp => "rh-zup",
            CoordinateSystem::LeftHandedYUp => "lh-yup",
            CoordinateSystem::LeftHandedZUp => "lh-zup",
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoordinateSystem {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        CoordinateSystem::ALL
            .into_iter()
            .find(|cs| cs.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownCoordinateSystem(s.to_owned()))
    }
}

/// Placement of one layer as edited by the user.
///
/// Rotation is in degrees, scale in percent per axis. The pivot is given in
/// normalized model space and ends up at `position` in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerTransform {
    pub position: Vec3,
    pub rotation_deg: Vec3,
    pub scale_percent: Vec3,
    pub pivot: Vec3,
    pub coordinate_system: CoordinateSystem,
}

impl LayerTransform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_deg: Vec3::ZERO,
            scale_percent: Vec3::splat(100.0),
            pivot: Vec3::ZERO,
            coordinate_system: CoordinateSystem::RightHandedYUp,
        }
    }

    /// X applied first, then Y, then Z.
    #[inline]
    pub fn rotation_matrix(&self) -> Mat4 {
        let r = self.rotation_deg;
        Mat4::from_rotation_z(r.z.to_radians())
            * Mat4::from_rotation_y(r.y.to_radians())
            * Mat4::from_rotation_x(r.x.to_radians())
    }

    #[inline]
    pub fn scale_factors(&self) -> Vec3 {
        self.scale_percent / 100.0
    }
}

impl Default for LayerTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Bounding information produced by the mesh importer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelBounds {
    pub center: Vec3,
    pub scale: f32,
}

impl ModelBounds {
    pub const UNIT: ModelBounds = ModelBounds {
        center: Vec3::ZERO,
        scale: 1.0,
    };

    /// Moves the bounding-box center to the origin and fits the box to the
    /// canonical size.
    #[inline]
    pub fn normalization(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.scale)) * Mat4::from_translation(-self.center)
    }
}

impl Default for ModelBounds {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Everything about one layer that feeds a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerState {
    pub transform: LayerTransform,
    pub bounds: ModelBounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn right_handed_y_up_needs_no_conversion() {
        assert_eq!(
            CoordinateSystem::RightHandedYUp.axis_conversion(),
            Mat4::IDENTITY
        );
    }

    #[test]
    fn z_up_source_maps_up_to_y() {
        let m = CoordinateSystem::RightHandedZUp.axis_conversion();
        assert!(approx(m.transform_point3(Vec3::Z), Vec3::Y));
        assert!(approx(m.transform_point3(Vec3::Y), -Vec3::Z));
    }

    #[test]
    fn left_handed_conversions_mirror_z() {
        let m = CoordinateSystem::LeftHandedYUp.axis_conversion();
        assert!(approx(m.transform_point3(vec(1.0, 2.0, 3.0)), vec(1.0, 2.0, -3.0)));

        let m = CoordinateSystem::LeftHandedZUp.axis_conversion();
        // rotate first: (0,0,1) -> (0,1,0), then negate z (no effect on y)
        assert!(approx(m.transform_point3(Vec3::Z), Vec3::Y));
        // (0,1,0) -> (0,0,-1) -> (0,0,1)
        assert!(approx(m.transform_point3(Vec3::Y), Vec3::Z));
        assert!(m.determinant() < 0.0);
    }

    fn vec(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::new(x, y, z)
    }

    #[test]
    fn coordinate_system_parses_from_config_strings() {
        assert_eq!(
            "RH_ZUP".parse::<CoordinateSystem>().unwrap(),
            CoordinateSystem::RightHandedZUp
        );
        for cs in CoordinateSystem::ALL {
            assert_eq!(cs.to_string().parse::<CoordinateSystem>().unwrap(), cs);
        }
        assert!("y-up".parse::<CoordinateSystem>().is_err());
    }

    #[test]
    fn rotation_applies_x_before_z() {
        let t = LayerTransform {
            rotation_deg: vec(90.0, 0.0, 90.0),
            ..LayerTransform::identity()
        };
        // X: (0,1,0) -> (0,0,1); Z leaves (0,0,1) untouched.
        assert!(approx(t.rotation_matrix().transform_point3(Vec3::Y), Vec3::Z));
    }

    #[test]
    fn normalization_centers_and_fits() {
        let bounds = ModelBounds {
            center: vec(10.0, 0.0, 0.0),
            scale: 0.5,
        };
        let m = bounds.normalization();
        assert!(approx(m.transform_point3(vec(10.0, 0.0, 0.0)), Vec3::ZERO));
        assert!(approx(m.transform_point3(vec(12.0, 2.0, 0.0)), vec(1.0, 1.0, 0.0)));
    }
}
