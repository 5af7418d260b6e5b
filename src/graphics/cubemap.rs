//! Equirectangular map → vertical cross → six cube map faces.
//!
//! The vertical cross is 3 faces wide and 4 faces tall:
//!
//! ```text
//!       +----+
//!       | +Y |
//!  +----+----+----+
//!  | -X | +Z | +X |
//!  +----+----+----+
//!       | -Y |
//!       +----+
//!       | -Z |
//!       +----+
//! ```

use std::f32::consts::{FRAC_PI_2, PI};

use anyhow::{bail, Result};
use nalgebra::Vector3;

use super::bitmap::Bitmap;

/// Direction through texel `(i, j)` of cross cell `face`, with coordinates in `[-1, 1]`.
fn face_direction(i: usize, j: usize, face: usize, face_size: usize) -> Vector3<f32> {
    let a = 2.0 * i as f32 / face_size as f32;
    let b = 2.0 * j as f32 / face_size as f32;

    match face {
        0 => Vector3::new(-1.0, a - 1.0, b - 1.0),
        1 => Vector3::new(a - 1.0, -1.0, 1.0 - b),
        2 => Vector3::new(1.0, a - 1.0, 1.0 - b),
        3 => Vector3::new(1.0 - a, 1.0, 1.0 - b),
        4 => Vector3::new(b - 1.0, a - 1.0, 1.0),
        _ => Vector3::new(1.0 - b, a - 1.0, -1.0),
    }
}

/// Resamples an equirectangular (longitude/latitude) map into a vertical cross with bilinear
/// filtering. The face size is a quarter of the input width.
pub fn equirect_to_vertical_cross(input: &Bitmap) -> Result<Bitmap> {
    let face_size = input.width / 4;
    if face_size == 0 || input.height == 0 {
        bail!("{}x{} is too small for a cube map", input.width, input.height);
    }

    let mut cross = Bitmap::new(face_size * 3, face_size * 4, input.comp)?;
    let offsets = [
        (face_size, face_size * 3),
        (0, face_size),
        (face_size, face_size),
        (face_size * 2, face_size),
        (face_size, 0),
        (face_size, face_size * 2),
    ];

    let max_u = input.width as i64 - 1;
    let max_v = input.height as i64 - 1;
    let fs = face_size as f32;

    for (face, &(ox, oy)) in offsets.iter().enumerate() {
        for i in 0..face_size {
            for j in 0..face_size {
                let p = face_direction(i, j, face, face_size);
                let r = p.x.hypot(p.y);
                let theta = p.y.atan2(p.x);
                let phi = p.z.atan2(r);

                let uf = 2.0 * fs * (theta + PI) / PI;
                let vf = 2.0 * fs * (FRAC_PI_2 - phi) / PI;

                let u1 = (uf.floor() as i64).max(0).min(max_u);
                let v1 = (vf.floor() as i64).max(0).min(max_v);
                let u2 = (u1 + 1).min(max_u);
                let v2 = (v1 + 1).min(max_v);
                let s = uf - u1 as f32;
                let t = vf - v1 as f32;

                let a = input.pixel(u1 as usize, v1 as usize);
                let b = input.pixel(u2 as usize, v1 as usize);
                let c = input.pixel(u1 as usize, v2 as usize);
                let d = input.pixel(u2 as usize, v2 as usize);

                let mut color = [0.0; 4];
                for k in 0..4 {
                    color[k] = a[k] * (1.0 - s) * (1.0 - t) + b[k] * s * (1.0 - t) + c[k] * (1.0 - s) * t + d[k] * s * t;
                }

                cross.set_pixel(i + ox, j + oy, color);
            }
        }
    }

    Ok(cross)
}

/// Cuts a vertical cross into six faces in `+X, -X, +Y, -Y, +Z, -Z` layer order.
pub fn vertical_cross_to_faces(cross: &Bitmap) -> Result<Bitmap> {
    let fw = cross.width / 3;
    let fh = cross.height / 4;
    if fw == 0 || fh == 0 || fw * 3 != cross.width || fh * 4 != cross.height {
        bail!("{}x{} is not a vertical cross", cross.width, cross.height);
    }

    let mut faces = Bitmap::new_layers(fw, fh, 6, cross.comp)?;

    for face in 0..6 {
        for j in 0..fh {
            for i in 0..fw {
                let (x, y) = match face {
                    0 => (i, fh + j),
                    1 => (2 * fw + i, fh + j),
                    2 => (2 * fw - 1 - i, fh - 1 - j),
                    3 => (2 * fw - 1 - i, 3 * fh - 1 - j),
                    4 => (2 * fw - 1 - i, cross.height - 1 - j),
                    _ => (fw + i, fh + j),
                };
                faces.set_pixel_in(i, j, face, cross.pixel(x, y));
            }
        }
    }

    Ok(faces)
}

#[cfg(test)]
mod test {
    use super::*;

    fn constant(width: usize, height: usize, value: f32) -> Bitmap {
        Bitmap::from_data(width, height, 3, vec![value; width * height * 3]).unwrap()
    }

    #[test]
    fn cross_is_three_by_four_faces() {
        let cross = equirect_to_vertical_cross(&constant(16, 8, 1.0)).unwrap();
        assert_eq!((cross.width, cross.height), (12, 16));
    }

    #[test]
    fn constant_map_stays_constant_inside_the_cross() {
        let cross = equirect_to_vertical_cross(&constant(16, 8, 0.25)).unwrap();
        // centre of +Z
        assert!((cross.pixel(6, 6)[0] - 0.25).abs() < 1e-5);
        // the corners are outside the cross
        assert_eq!(cross.pixel(0, 0), [0.0; 4]);
        assert_eq!(cross.pixel(11, 15), [0.0; 4]);
    }

    #[test]
    fn tiny_inputs_are_rejected() {
        assert!(equirect_to_vertical_cross(&constant(3, 2, 1.0)).is_err());
    }

    #[test]
    fn faces_are_cut_from_the_documented_cells() {
        let fs = 2;
        let mut cross = Bitmap::new(3 * fs, 4 * fs, 3).unwrap();
        for y in 0..4 * fs {
            for x in 0..3 * fs {
                cross.set_pixel(x, y, [x as f32, y as f32, 0.0, 0.0]);
            }
        }

        let faces = vertical_cross_to_faces(&cross).unwrap();
        assert_eq!((faces.width, faces.height, faces.depth), (fs, fs, 6));

        let expected = [(0, 2), (4, 2), (3, 1), (3, 5), (3, 7), (2, 2)];
        let face_len = fs * fs * 3;
        for (face, &(x, y)) in expected.iter().enumerate() {
            let first = &faces.data()[face * face_len..face * face_len + 2];
            assert_eq!(first, &[x as f32, y as f32], "face {}", face);
        }
    }

    #[test]
    fn crosses_with_uneven_cells_are_rejected() {
        assert!(vertical_cross_to_faces(&Bitmap::new(7, 8, 3).unwrap()).is_err());
        assert!(vertical_cross_to_faces(&Bitmap::new(2, 3, 3).unwrap()).is_err());
    }
}
