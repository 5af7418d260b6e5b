use nalgebra::{Matrix4, Vector3};

const FOV_Y_DEGREES: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;

/// Right-handed perspective projection looking down -Z.
pub fn perspective(aspect: f32) -> Matrix4<f32> {
    Matrix4::new_perspective(aspect, FOV_Y_DEGREES.to_radians(), Z_NEAR, Z_FAR)
}

/// Orthographic projection that keeps a unit square square at any aspect ratio.
pub fn ortho(aspect: f32) -> Matrix4<f32> {
    Matrix4::new_orthographic(-aspect, aspect, -1.0, 1.0, 1.0, -1.0)
}

pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// Rotation of `angle` radians about `axis`, which need not be normalised.
pub fn rotation(angle: f32, axis: Vector3<f32>) -> Matrix4<f32> {
    match nalgebra::Unit::try_new(axis, f32::EPSILON) {
        Some(axis) => Matrix4::from_axis_angle(&axis, angle),
        None => Matrix4::identity(),
    }
}
