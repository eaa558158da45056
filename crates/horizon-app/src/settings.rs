//! Translate the persisted [`Config`] into scene settings.

use horizon_config::{Config, SkyConfig, ToneMappingMode};
use horizon_scene::{SceneSettings, ToneMapping};
use horizon_sky::{ScatteringBinding, SkyParameters};

pub fn tone_mapping(mode: ToneMappingMode) -> ToneMapping {
    match mode {
        ToneMappingMode::None => ToneMapping::None,
        ToneMappingMode::Linear => ToneMapping::Linear,
        ToneMappingMode::AcesFilmic => ToneMapping::AcesFilmic,
    }
}

pub fn sky_parameters(sky: &SkyConfig) -> SkyParameters {
    SkyParameters {
        turbidity: sky.turbidity,
        rayleigh: sky.rayleigh,
        mie_coefficient: sky.mie_coefficient,
        mie_directional_g: sky.mie_directional_g,
        elevation: sky.elevation,
        azimuth: sky.azimuth,
        exposure: sky.exposure,
    }
}

pub fn scattering_binding(sky: &SkyConfig) -> ScatteringBinding {
    if sky.pin_scattering {
        ScatteringBinding::Pinned
    } else {
        ScatteringBinding::Live
    }
}

/// A configured ratio of 0 (or anything non-positive) follows the display.
pub fn effective_pixel_ratio(configured: f64, scale_factor: f64) -> f32 {
    if configured.is_finite() && configured > 0.0 {
        configured as f32
    } else if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor as f32
    } else {
        1.0
    }
}

pub fn scene_settings(config: &Config, scale_factor: f64) -> SceneSettings {
    SceneSettings {
        sky: sky_parameters(&config.sky),
        scattering: scattering_binding(&config.sky),
        pixel_ratio: effective_pixel_ratio(config.render.pixel_ratio, scale_factor),
        tone_mapping: tone_mapping(config.render.tone_mapping),
        animate_box: config.scene.animate_box,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_scene_defaults() {
        let settings = scene_settings(&Config::default(), 1.0);
        assert_eq!(settings.sky, SkyParameters::default());
        assert_eq!(settings.scattering, ScatteringBinding::Live);
        assert_eq!(settings.tone_mapping, ToneMapping::AcesFilmic);
        assert_eq!(settings.pixel_ratio, 1.0);
        assert!(settings.animate_box);
    }

    #[test]
    fn test_pixel_ratio_follows_display_when_zero() {
        assert_eq!(effective_pixel_ratio(0.0, 2.0), 2.0);
        assert_eq!(effective_pixel_ratio(1.5, 2.0), 1.5);
        assert_eq!(effective_pixel_ratio(-1.0, 0.0), 1.0);
        assert_eq!(effective_pixel_ratio(f64::NAN, 1.25), 1.25);
    }

    #[test]
    fn test_pinned_scattering() {
        let mut config = Config::default();
        config.sky.pin_scattering = true;
        config.sky.turbidity = 2.0;
        let settings = scene_settings(&config, 1.0);
        assert_eq!(settings.scattering, ScatteringBinding::Pinned);
        assert_eq!(settings.sky.turbidity, 2.0);
    }

    #[test]
    fn test_tone_mapping_modes() {
        assert_eq!(tone_mapping(ToneMappingMode::None), ToneMapping::None);
        assert_eq!(tone_mapping(ToneMappingMode::Linear), ToneMapping::Linear);
        assert_eq!(tone_mapping(ToneMappingMode::AcesFilmic), ToneMapping::AcesFilmic);
    }
}
