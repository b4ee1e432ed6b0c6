//! Geometric utilities over normalized landmark coordinates.
//!
//! All quantities are in normalized image space. No face-size normalization
//! is applied, so the same physical expression yields larger offsets when the
//! subject is closer to the camera.

use nalgebra::{Vector2, Vector3};

use crate::types::LandmarkPoint;

pub fn to_vector3(p: &LandmarkPoint) -> Vector3<f64> {
    Vector3::new(p.x, p.y, p.z)
}

pub fn to_vector2(p: &LandmarkPoint) -> Vector2<f64> {
    Vector2::new(p.x, p.y)
}

/// Planar (x, y) distance
pub fn distance_2d(a: &LandmarkPoint, b: &LandmarkPoint) -> f64 {
    (to_vector2(a) - to_vector2(b)).norm()
}

/// Euclidean distance including relative depth
pub fn distance_3d(a: &LandmarkPoint, b: &LandmarkPoint) -> f64 {
    (to_vector3(a) - to_vector3(b)).norm()
}

pub fn midpoint(a: &LandmarkPoint, b: &LandmarkPoint) -> LandmarkPoint {
    LandmarkPoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
}

/// Planar angle at `vertex` between rays to `a` and `c`, in degrees [0, 180]
pub fn angle_at(a: &LandmarkPoint, vertex: &LandmarkPoint, c: &LandmarkPoint) -> f64 {
    let v1 = to_vector2(a) - to_vector2(vertex);
    let v2 = to_vector2(c) - to_vector2(vertex);
    let norms = v1.norm() * v2.norm();
    if norms < 1e-12 {
        return 0.0;
    }
    (v1.dot(&v2) / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = LandmarkPoint::new(0.0, 0.0, 0.0);
        let b = LandmarkPoint::new(0.3, 0.4, 1.2);
        assert!((distance_2d(&a, &b) - 0.5).abs() < 1e-12);
        assert!((distance_3d(&a, &b) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_right_angle() {
        let a = LandmarkPoint::new(1.0, 0.0, 0.0);
        let v = LandmarkPoint::new(0.0, 0.0, 0.0);
        let c = LandmarkPoint::new(0.0, 1.0, 0.0);
        assert!((angle_at(&a, &v, &c) - 90.0).abs() < 1e-9);
        assert_eq!(angle_at(&v, &v, &c), 0.0);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[]), 0.0);
        assert!((std_dev(&[0.0, 1.0]) - 0.5).abs() < 1e-12);
    }
}
