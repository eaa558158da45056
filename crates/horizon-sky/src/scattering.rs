//! Sky surface uniforms and the scattering terms derived from them.
//!
//! The per-pixel sky shader needs a handful of values that depend only on the
//! uniforms (sun intensity, fade, total Rayleigh/Mie extinction). They are
//! computed here on the CPU whenever the uniforms change instead of once per
//! vertex on the GPU.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Total Rayleigh scattering coefficients for (680, 550, 450) nm.
pub const TOTAL_RAYLEIGH: Vec3 = Vec3::new(
    5.804_543e-6,
    1.356_291_1e-5,
    3.026_590_2e-5,
);

/// Wavelength-dependent Mie constant, already multiplied through by pi and K.
pub const MIE_CONST: Vec3 = Vec3::new(
    1.839_991_8e14,
    2.779_802_4e14,
    4.079_048e14,
);

/// Zenith angle beyond which the sun contributes nothing (about 92.3 degrees).
pub const CUTOFF_ANGLE: f32 = 1.611_073_2;

/// Falloff steepness of sun intensity near the cutoff angle.
pub const STEEPNESS: f32 = 1.5;

/// Peak sun irradiance.
pub const SUN_IRRADIANCE: f32 = 1000.0;

/// Values fed to the sky surface, named after its shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyUniforms {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Direction (or position) of the sun; only its direction matters for
    /// intensity, its height also drives [`DerivedScattering::sun_fade`].
    pub sun_position: Vec3,
    /// World up axis.
    pub up: Vec3,
}

impl Default for SkyUniforms {
    fn default() -> Self {
        Self {
            turbidity: 2.0,
            rayleigh: 1.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
            sun_position: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

/// Scattering terms derived from [`SkyUniforms`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedScattering {
    /// Normalized sun direction (`up` when the sun position is zero).
    pub sun_direction: Vec3,
    /// Sun irradiance after horizon cutoff.
    pub sun_intensity: f32,
    /// 1 at and above the horizon, fading toward 0 as the sun sinks far below.
    pub sun_fade: f32,
    /// Rayleigh extinction per color channel.
    pub beta_r: Vec3,
    /// Mie extinction per color channel.
    pub beta_m: Vec3,
}

impl DerivedScattering {
    /// Recompute every derived term from `uniforms`.
    pub fn compute(uniforms: &SkyUniforms) -> Self {
        let sun_direction = uniforms.sun_position.try_normalize().unwrap_or(uniforms.up);
        let sun_intensity = sun_intensity(sun_direction.dot(uniforms.up));
        let sun_fade = 1.0 - (1.0 - (uniforms.sun_position.y / 450_000.0).exp()).clamp(0.0, 1.0);
        let rayleigh_coefficient = uniforms.rayleigh - (1.0 - sun_fade);

        Self {
            sun_direction,
            sun_intensity,
            sun_fade,
            beta_r: TOTAL_RAYLEIGH * rayleigh_coefficient,
            beta_m: total_mie(uniforms.turbidity) * uniforms.mie_coefficient,
        }
    }
}

fn sun_intensity(zenith_angle_cos: f32) -> f32 {
    let zenith_angle = zenith_angle_cos.clamp(-1.0, 1.0).acos();
    SUN_IRRADIANCE * (1.0 - (-(CUTOFF_ANGLE - zenith_angle) / STEEPNESS).exp()).max(0.0)
}

fn total_mie(turbidity: f32) -> Vec3 {
    let concentration = 0.2 * turbidity * 10e-18;
    MIE_CONST * (0.434 * concentration)
}

/// The sky surface: its uniforms plus the terms derived from them.
///
/// Lives in the scene graph's sky node; geometry and scale come from that
/// node's transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sky {
    pub uniforms: SkyUniforms,
    derived: DerivedScattering,
}

impl Sky {
    /// A sky with default uniforms and the sun at the zenith.
    pub fn new() -> Self {
        let uniforms = SkyUniforms::default();
        Self {
            uniforms,
            derived: DerivedScattering::compute(&uniforms),
        }
    }

    /// Derived terms as of the last [`refresh`](Self::refresh).
    pub fn derived(&self) -> &DerivedScattering {
        &self.derived
    }

    /// Recompute the derived terms after editing [`uniforms`](Self::uniforms).
    pub fn refresh(&mut self) {
        self.derived = DerivedScattering::compute(&self.uniforms);
    }
}

impl Default for Sky {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU-side sky uniform buffer. Matches the WGSL `SkyUniform` struct.
///
/// Every `vec3<f32>` is followed by a scalar so the 16-byte alignment rule is
/// met without explicit padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SkyGpuUniform {
    /// Inverse view-projection, rotation only. (offset 0)
    pub inv_view_proj: [[f32; 4]; 4],
    /// Camera position in world space. (offset 64)
    pub camera_position: [f32; 3],
    /// Tone mapping exposure. (offset 76)
    pub exposure: f32,
    /// (offset 80)
    pub sun_direction: [f32; 3],
    /// (offset 92)
    pub sun_intensity: f32,
    /// (offset 96)
    pub up: [f32; 3],
    /// (offset 108)
    pub sun_fade: f32,
    /// (offset 112)
    pub beta_r: [f32; 3],
    /// (offset 124)
    pub mie_directional_g: f32,
    /// (offset 128)
    pub beta_m: [f32; 3],
    /// 0 = none, 1 = linear, 2 = ACES filmic. (offset 140)
    pub tone_mapping: u32,
}

impl SkyGpuUniform {
    /// Pack a sky and per-frame camera state.
    pub fn new(
        sky: &Sky,
        inv_view_proj: Mat4,
        camera_position: Vec3,
        exposure: f32,
        tone_mapping: u32,
    ) -> Self {
        let derived = sky.derived();
        Self {
            inv_view_proj: inv_view_proj.to_cols_array_2d(),
            camera_position: camera_position.to_array(),
            exposure,
            sun_direction: derived.sun_direction.to_array(),
            sun_intensity: derived.sun_intensity,
            up: sky.uniforms.up.to_array(),
            sun_fade: derived.sun_fade,
            beta_r: derived.beta_r.to_array(),
            mie_directional_g: sky.uniforms.mie_directional_g,
            beta_m: derived.beta_m.to_array(),
            tone_mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sun_direction;

    fn uniforms_with_sun(elevation: f32) -> SkyUniforms {
        SkyUniforms {
            sun_position: sun_direction(elevation, 0.0),
            ..SkyUniforms::default()
        }
    }

    #[test]
    fn test_gpu_uniform_size() {
        assert_eq!(std::mem::size_of::<SkyGpuUniform>(), 144);
        assert_eq!(std::mem::size_of::<SkyGpuUniform>() % 16, 0);
    }

    #[test]
    fn test_zenith_sun_intensity() {
        let derived = DerivedScattering::compute(&uniforms_with_sun(90.0));
        let expected = SUN_IRRADIANCE * (1.0 - (-CUTOFF_ANGLE / STEEPNESS).exp());
        assert!((derived.sun_intensity - expected).abs() < 1e-2);
    }

    #[test]
    fn test_intensity_falls_toward_horizon() {
        let high = DerivedScattering::compute(&uniforms_with_sun(60.0)).sun_intensity;
        let low = DerivedScattering::compute(&uniforms_with_sun(5.0)).sun_intensity;
        let horizon = DerivedScattering::compute(&uniforms_with_sun(0.0)).sun_intensity;
        assert!(high > low && low > horizon);
        assert!(horizon > 0.0);
    }

    #[test]
    fn test_intensity_zero_below_cutoff() {
        let derived = DerivedScattering::compute(&uniforms_with_sun(-10.0));
        assert_eq!(derived.sun_intensity, 0.0);
    }

    #[test]
    fn test_unit_sun_has_full_fade() {
        let derived = DerivedScattering::compute(&uniforms_with_sun(10.3));
        assert!((derived.sun_fade - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_beta_terms_scale_with_inputs() {
        let base = SkyUniforms {
            sun_position: Vec3::Y,
            ..SkyUniforms::default()
        };
        let doubled = SkyUniforms {
            turbidity: base.turbidity * 2.0,
            ..base
        };
        let a = DerivedScattering::compute(&base);
        let b = DerivedScattering::compute(&doubled);
        assert!((b.beta_m.x / a.beta_m.x - 2.0).abs() < 1e-4);
        assert_eq!(a.beta_r, b.beta_r);
        // Blue scatters more than red.
        assert!(a.beta_r.z > a.beta_r.x);
    }

    #[test]
    fn test_zero_sun_position_falls_back_to_up() {
        let derived = DerivedScattering::compute(&SkyUniforms::default());
        assert_eq!(derived.sun_direction, Vec3::Y);
        assert!(derived.sun_intensity.is_finite());
    }

    #[test]
    fn test_refresh_updates_derived() {
        let mut sky = Sky::new();
        let before = *sky.derived();
        sky.uniforms.sun_position = sun_direction(5.0, 90.0);
        assert_eq!(*sky.derived(), before);
        sky.refresh();
        assert_ne!(sky.derived().sun_direction, before.sun_direction);
    }

    #[test]
    fn test_gpu_uniform_packs_fields() {
        let mut sky = Sky::new();
        sky.uniforms.mie_directional_g = 0.705;
        sky.refresh();
        let gpu = SkyGpuUniform::new(&sky, Mat4::IDENTITY, Vec3::new(1.0, 2.0, 3.0), 0.5, 2);
        assert_eq!(gpu.camera_position, [1.0, 2.0, 3.0]);
        assert_eq!(gpu.exposure, 0.5);
        assert_eq!(gpu.mie_directional_g, 0.705);
        assert_eq!(gpu.tone_mapping, 2);
        assert_eq!(gpu.up, [0.0, 1.0, 0.0]);
    }
}
