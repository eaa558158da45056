//! The sky parameter model and its recompute-and-render contract.

use tracing::{debug, warn};

use crate::params::{SkyField, SkyParameters};
use crate::scattering::Sky;
use crate::sun::sun_direction;

/// Scattering values written when [`ScatteringBinding::Pinned`] is active:
/// turbidity, rayleigh, mie coefficient, mie directional g.
pub const PINNED_SCATTERING: [f32; 4] = [30.0, 1.492, 0.001, 0.705];

/// Where the four scattering uniforms take their values from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScatteringBinding {
    /// Read turbidity, rayleigh and both Mie terms from the live parameters.
    #[default]
    Live,
    /// Write [`PINNED_SCATTERING`] every time; only elevation, azimuth and
    /// exposure follow their panel controls.
    Pinned,
}

/// Something that owns a sky surface and can render it.
pub trait SkyTarget {
    /// The sky surface whose uniforms are rewritten, if the target has one.
    fn sky_mut(&mut self) -> Option<&mut Sky>;
    /// Set the renderer's tone mapping exposure.
    fn set_exposure(&mut self, exposure: f32);
    /// Render one frame synchronously.
    fn render(&mut self);
}

/// Owns the sky parameters and pushes them into a [`SkyTarget`].
#[derive(Debug, Clone, Default)]
pub struct SkyParameterModel {
    params: SkyParameters,
    binding: ScatteringBinding,
}

impl SkyParameterModel {
    pub fn new(params: SkyParameters, binding: ScatteringBinding) -> Self {
        Self { params, binding }
    }

    pub fn params(&self) -> &SkyParameters {
        &self.params
    }

    /// Mutable access for the controlling widget. Call
    /// [`apply_and_render`](Self::apply_and_render) afterwards.
    pub fn params_mut(&mut self) -> &mut SkyParameters {
        &mut self.params
    }

    pub fn set(&mut self, field: SkyField, value: f32) {
        self.params.set(field, value);
    }

    pub fn binding(&self) -> ScatteringBinding {
        self.binding
    }

    pub fn set_binding(&mut self, binding: ScatteringBinding) {
        self.binding = binding;
    }

    /// Turbidity, rayleigh, mie coefficient and mie directional g as they will
    /// be written to the sky.
    pub fn scattering_inputs(&self) -> [f32; 4] {
        match self.binding {
            ScatteringBinding::Live => [
                self.params.turbidity,
                self.params.rayleigh,
                self.params.mie_coefficient,
                self.params.mie_directional_g,
            ],
            ScatteringBinding::Pinned => PINNED_SCATTERING,
        }
    }

    /// Rewrite the sky uniforms and renderer exposure from the current
    /// parameters, then render once.
    ///
    /// Total over any input: degenerate angles give an odd-looking but valid
    /// sky. A target without a sky still gets its exposure set and renders.
    pub fn apply_and_render<T: SkyTarget + ?Sized>(&self, target: &mut T) {
        let [turbidity, rayleigh, mie_coefficient, mie_directional_g] = self.scattering_inputs();
        let sun = sun_direction(self.params.elevation, self.params.azimuth);

        match target.sky_mut() {
            Some(sky) => {
                sky.uniforms.turbidity = turbidity;
                sky.uniforms.rayleigh = rayleigh;
                sky.uniforms.mie_coefficient = mie_coefficient;
                sky.uniforms.mie_directional_g = mie_directional_g;
                sky.uniforms.sun_position = sun;
                sky.refresh();
            }
            None => warn!("no sky surface to update"),
        }

        debug!(
            elevation = self.params.elevation,
            azimuth = self.params.azimuth,
            exposure = self.params.exposure,
            "sky parameters applied"
        );

        target.set_exposure(self.params.exposure);
        target.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[derive(Default)]
    struct RecordingTarget {
        sky: Sky,
        exposure: f32,
        renders: u32,
    }

    impl SkyTarget for RecordingTarget {
        fn sky_mut(&mut self) -> Option<&mut Sky> {
            Some(&mut self.sky)
        }

        fn set_exposure(&mut self, exposure: f32) {
            self.exposure = exposure;
        }

        fn render(&mut self) {
            self.renders += 1;
        }
    }

    #[test]
    fn test_apply_writes_all_uniforms() {
        let params = SkyParameters {
            turbidity: 1.5,
            rayleigh: 2.0,
            mie_coefficient: 0.05,
            mie_directional_g: 0.3,
            elevation: 45.0,
            azimuth: -90.0,
            exposure: 0.4,
        };
        let model = SkyParameterModel::new(params, ScatteringBinding::Live);
        let mut target = RecordingTarget::default();
        model.apply_and_render(&mut target);

        let u = target.sky.uniforms;
        assert_eq!(u.turbidity, 1.5);
        assert_eq!(u.rayleigh, 2.0);
        assert_eq!(u.mie_coefficient, 0.05);
        assert_eq!(u.mie_directional_g, 0.3);
        assert_eq!(u.sun_position, sun_direction(45.0, -90.0));
        assert_eq!(target.exposure, 0.4);
        assert_eq!(target.renders, 1);
    }

    #[test]
    fn test_apply_refreshes_derived_terms() {
        let model = SkyParameterModel::default();
        let mut target = RecordingTarget::default();
        model.apply_and_render(&mut target);
        let dir = target.sky.derived().sun_direction;
        assert!((dir - sun_direction(10.3, 153.4)).length() < 1e-6);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let model = SkyParameterModel::default();
        let mut target = RecordingTarget::default();
        model.apply_and_render(&mut target);
        let first = target.sky;
        model.apply_and_render(&mut target);
        assert_eq!(target.sky, first);
        assert_eq!(target.renders, 2);
    }

    #[test]
    fn test_pinned_binding_ignores_scattering_edits() {
        let mut model = SkyParameterModel::new(SkyParameters::default(), ScatteringBinding::Pinned);
        model.set(SkyField::Turbidity, 1.0);
        model.set(SkyField::Rayleigh, 3.0);
        model.set(SkyField::Elevation, 30.0);
        model.set(SkyField::Exposure, 0.25);

        let mut target = RecordingTarget::default();
        model.apply_and_render(&mut target);

        assert_eq!(target.sky.uniforms.turbidity, PINNED_SCATTERING[0]);
        assert_eq!(target.sky.uniforms.rayleigh, PINNED_SCATTERING[1]);
        assert_eq!(target.sky.uniforms.sun_position, sun_direction(30.0, 153.4));
        assert_eq!(target.exposure, 0.25);
    }

    #[test]
    fn test_live_binding_follows_edits() {
        let mut model = SkyParameterModel::default();
        model.set(SkyField::MieDirectionalG, 0.1);
        let mut target = RecordingTarget::default();
        model.apply_and_render(&mut target);
        assert_eq!(target.sky.uniforms.mie_directional_g, 0.1);
    }

    #[test]
    fn test_degenerate_angles_stay_finite() {
        let mut model = SkyParameterModel::default();
        model.set(SkyField::Elevation, 90.0);
        model.set(SkyField::Azimuth, 180.0);
        let mut target = RecordingTarget::default();
        model.apply_and_render(&mut target);
        assert!(target.sky.uniforms.sun_position.is_finite());
        assert!((target.sky.uniforms.sun_position - Vec3::Y).length() < 1e-5);
    }

    #[derive(Default)]
    struct SkylessTarget {
        exposure: f32,
        renders: u32,
    }

    impl SkyTarget for SkylessTarget {
        fn sky_mut(&mut self) -> Option<&mut Sky> {
            None
        }

        fn set_exposure(&mut self, exposure: f32) {
            self.exposure = exposure;
        }

        fn render(&mut self) {
            self.renders += 1;
        }
    }

    #[test]
    fn test_target_without_sky_still_renders() {
        let mut model = SkyParameterModel::default();
        model.set(SkyField::Exposure, 0.5);
        let mut target = SkylessTarget::default();
        model.apply_and_render(&mut target);
        assert_eq!(target.exposure, 0.5);
        assert_eq!(target.renders, 1);
    }
}
