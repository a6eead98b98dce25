//! Frame constants from layer, camera and light state.

use corelib::{
    camera::Camera,
    light::{LightState, OverlayColors},
    transform::LayerState,
};

use glam::{Mat4, Vec4};

use crate::constants::ShadingConstants;

/// Builds [`ShadingConstants`] for one frame.
///
/// Holds only configuration that does not change per frame; building is a
/// pure function of its inputs and may run on any thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneTransformBuilder {
    pub overlay: OverlayColors,
}

impl SceneTransformBuilder {
    pub fn new(overlay: OverlayColors) -> Self {
        Self { overlay }
    }

    /// Local-to-world matrix of a layer.
    ///
    /// Applied to geometry in this order: move the model center to the
    /// origin and normalize its size, move the pivot to the origin, convert
    /// the authoring convention, rotate about X then Y then Z, scale, then
    /// translate to the layer position.
    pub fn world_matrix(layer: &LayerState) -> Mat4 {
        let t = &layer.transform;
        let pivot = Mat4::from_translation(-t.pivot) * layer.bounds.normalization();
        Mat4::from_translation(t.position)
            * Mat4::from_scale(t.scale_factors())
            * t.rotation_matrix()
            * t.coordinate_system.axis_conversion()
            * pivot
    }

    pub fn build(&self, layer: &LayerState, camera: &Camera, light: &LightState) -> ShadingConstants {
        let world = Self::world_matrix(layer);
        let world_view_proj = camera.view_projection() * world;

        ShadingConstants {
            world: world.to_cols_array_2d(),
            world_view_proj: world_view_proj.to_cols_array_2d(),
            light_position: light.position.extend(1.0).to_array(),
            light_color: light.color.to_vec4().to_array(),
            ambient_color: light.ambient.to_vec4().to_array(),
            base_color: Vec4::ONE.to_array(),
            camera_position: camera.eye.extend(1.0).to_array(),
            light_enabled: if light.enabled { 1.0 } else { 0.0 },
            diffuse_intensity: light.diffuse_intensity,
            specular_intensity: light.specular_intensity,
            shininess: light.shininess,
            grid_color: self.overlay.grid.to_vec4().to_array(),
            axis_x_color: self.overlay.axis_x.to_vec4().to_array(),
            axis_y_color: self.overlay.axis_y.to_vec4().to_array(),
            axis_z_color: self.overlay.axis_z.to_vec4().to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use corelib::{
        light::Rgba8,
        transform::{CoordinateSystem, LayerTransform, ModelBounds},
    };
    use glam::{Vec3, vec3};

    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    fn layer(transform: LayerTransform) -> LayerState {
        LayerState {
            transform,
            bounds: ModelBounds::UNIT,
        }
    }

    #[test]
    fn default_layer_world_is_identity() {
        assert_eq!(
            SceneTransformBuilder::world_matrix(&LayerState::default()),
            Mat4::IDENTITY
        );
    }

    #[test]
    fn model_center_lands_on_layer_position() {
        let state = LayerState {
            transform: LayerTransform {
                position: vec3(5.0, 0.0, 0.0),
                rotation_deg: vec3(30.0, 45.0, 60.0),
                ..LayerTransform::identity()
            },
            bounds: ModelBounds {
                center: vec3(10.0, 10.0, 10.0),
                scale: 0.1,
            },
        };
        let world = SceneTransformBuilder::world_matrix(&state);
        assert!(approx(world.transform_point3(vec3(10.0, 10.0, 10.0)), vec3(5.0, 0.0, 0.0)));
    }

    #[test]
    fn scale_is_percent_and_applied_after_rotation() {
        let world = SceneTransformBuilder::world_matrix(&layer(LayerTransform {
            rotation_deg: vec3(0.0, 0.0, 90.0),
            scale_percent: vec3(200.0, 100.0, 100.0),
            ..LayerTransform::identity()
        }));
        // rotate (1,0,0) -> (0,1,0), then scale x by 2 leaves it alone
        assert!(approx(world.transform_point3(Vec3::X), Vec3::Y));
        assert!(approx(world.transform_point3(Vec3::Y), vec3(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn pivot_rotates_about_offset_point() {
        let world = SceneTransformBuilder::world_matrix(&layer(LayerTransform {
            rotation_deg: vec3(0.0, 180.0, 0.0),
            pivot: vec3(1.0, 0.0, 0.0),
            ..LayerTransform::identity()
        }));
        assert!(approx(world.transform_point3(vec3(1.0, 0.0, 0.0)), Vec3::ZERO));
        assert!(approx(world.transform_point3(Vec3::ZERO), vec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn z_up_asset_matches_manual_conversion() {
        let converted = SceneTransformBuilder::world_matrix(&layer(LayerTransform {
            coordinate_system: CoordinateSystem::RightHandedZUp,
            ..LayerTransform::identity()
        }));
        let manual = SceneTransformBuilder::world_matrix(&layer(LayerTransform::identity()))
            * Mat4::from_rotation_x(-90f32.to_radians());
        assert!(converted.abs_diff_eq(manual, 1e-6));
        assert!(approx(converted.transform_point3(Vec3::Z), Vec3::Y));
    }

    #[test]
    fn constants_carry_light_and_camera() {
        let camera = Camera::default();
        let light = LightState {
            enabled: false,
            color: Rgba8::opaque(255, 0, 51),
            ..LightState::default()
        };
        let c = SceneTransformBuilder::default().build(&LayerState::default(), &camera, &light);

        assert_eq!(c.light_enabled, 0.0);
        assert_eq!(c.light_color, [1.0, 0.0, 0.2, 1.0]);
        assert_eq!(c.camera_position, camera.eye.extend(1.0).to_array());
        assert_eq!(c.world, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(c.axis_x_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(c.base_color, [1.0; 4]);

        let expected = camera.view_projection().to_cols_array_2d();
        assert_eq!(c.world_view_proj, expected);

        let lit = SceneTransformBuilder::default().build(
            &LayerState::default(),
            &camera,
            &LightState::default(),
        );
        assert_eq!(lit.light_enabled, 1.0);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let c = SceneTransformBuilder::default().build(
            &LayerState::default(),
            &Camera::default(),
            &LightState::default(),
        );
        let clip = Mat4::from_cols_array_2d(&c.world_view_proj) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
