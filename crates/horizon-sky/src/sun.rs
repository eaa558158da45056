//! Sun direction from elevation and azimuth.

use glam::Vec3;

/// Unit vector pointing at the sun, +Y up.
///
/// `phi` is the polar angle from +Y (`90 - elevation`) and `theta` the
/// azimuth, both in degrees at the call site:
/// `(sin(phi) sin(theta), cos(phi), sin(phi) cos(theta))`.
pub fn sun_direction(elevation_deg: f32, azimuth_deg: f32) -> Vec3 {
    let phi = (90.0 - elevation_deg).to_radians();
    let theta = azimuth_deg.to_radians();
    let sin_phi = phi.sin();
    Vec3::new(sin_phi * theta.sin(), phi.cos(), sin_phi * theta.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_length_over_range() {
        let mut elevation = 0.0_f32;
        while elevation <= 90.0 {
            let mut azimuth = -180.0_f32;
            while azimuth <= 180.0 {
                let dir = sun_direction(elevation, azimuth);
                assert!(
                    (dir.length() - 1.0).abs() < 1e-5,
                    "|dir| = {} at e={elevation} a={azimuth}",
                    dir.length()
                );
                azimuth += 7.5;
            }
            elevation += 2.5;
        }
    }

    #[test]
    fn test_horizon_and_zenith_are_finite() {
        for azimuth in [-180.0, -90.0, 0.0, 90.0, 180.0] {
            let horizon = sun_direction(0.0, azimuth);
            let zenith = sun_direction(90.0, azimuth);
            assert!(horizon.is_finite());
            assert!(zenith.is_finite());
            assert!(horizon.y.abs() < 1e-6);
            assert!((zenith - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_default_sun_matches_formula() {
        let phi = 79.7_f32.to_radians();
        let theta = 153.4_f32.to_radians();
        let expected = Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());
        let dir = sun_direction(10.3, 153.4);
        assert!((dir - expected).length() < 1e-6, "{dir} vs {expected}");
        // Low sun, mostly toward -Z, slightly +X.
        assert!(dir.y > 0.17 && dir.y < 0.19);
        assert!(dir.z < -0.8);
        assert!(dir.x > 0.4);
    }

    #[test]
    fn test_azimuth_zero_faces_positive_z() {
        let dir = sun_direction(0.0, 0.0);
        assert!((dir - Vec3::Z).length() < 1e-6);
    }
}
