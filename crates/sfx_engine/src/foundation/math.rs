//! Math utilities and types
//!
//! Vector types for 3D audio positioning.

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Normalize a vector, falling back to `fallback` for zero-length input
pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    v.try_normalize(f32::EPSILON).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_or() {
        let n = normalize_or(Vec3::new(3.0, 0.0, 4.0), Vec3::z());
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(n.x, 0.6, epsilon = 1e-6);

        let fallback = normalize_or(Vec3::zeros(), Vec3::y());
        assert_eq!(fallback, Vec3::y());
    }
}
