//! User-facing sky parameters.

use serde::{Deserialize, Serialize};

/// Physical parameters controlling sky appearance and camera exposure.
///
/// Ranges are a property of the controlling widget (see
/// [`DebugPanel`](crate::DebugPanel)); this type stores whatever it is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyParameters {
    /// Haze amount; scales the Mie coefficient.
    pub turbidity: f32,
    /// Rayleigh scattering multiplier.
    pub rayleigh: f32,
    /// Mie scattering coefficient.
    pub mie_coefficient: f32,
    /// Henyey-Greenstein asymmetry of Mie scattering.
    pub mie_directional_g: f32,
    /// Sun elevation above the horizon, degrees.
    pub elevation: f32,
    /// Sun azimuth, degrees.
    pub azimuth: f32,
    /// Tone mapping exposure.
    pub exposure: f32,
}

impl Default for SkyParameters {
    fn default() -> Self {
        Self {
            turbidity: 30.0,
            rayleigh: 1.492,
            mie_coefficient: 0.001,
            mie_directional_g: 0.705,
            elevation: 10.3,
            azimuth: 153.4,
            exposure: 1.0,
        }
    }
}

/// Names one field of [`SkyParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkyField {
    Turbidity,
    Rayleigh,
    MieCoefficient,
    MieDirectionalG,
    Elevation,
    Azimuth,
    Exposure,
}

impl SkyField {
    /// All fields in panel order.
    pub const ALL: [SkyField; 7] = [
        SkyField::Turbidity,
        SkyField::Rayleigh,
        SkyField::MieCoefficient,
        SkyField::MieDirectionalG,
        SkyField::Elevation,
        SkyField::Azimuth,
        SkyField::Exposure,
    ];

    /// Display name, matching the parameter's shader uniform.
    pub fn name(self) -> &'static str {
        match self {
            SkyField::Turbidity => "turbidity",
            SkyField::Rayleigh => "rayleigh",
            SkyField::MieCoefficient => "mieCoefficient",
            SkyField::MieDirectionalG => "mieDirectionalG",
            SkyField::Elevation => "elevation",
            SkyField::Azimuth => "azimuth",
            SkyField::Exposure => "exposure",
        }
    }
}

impl SkyParameters {
    /// Read one field.
    pub fn get(&self, field: SkyField) -> f32 {
        match field {
            SkyField::Turbidity => self.turbidity,
            SkyField::Rayleigh => self.rayleigh,
            SkyField::MieCoefficient => self.mie_coefficient,
            SkyField::MieDirectionalG => self.mie_directional_g,
            SkyField::Elevation => self.elevation,
            SkyField::Azimuth => self.azimuth,
            SkyField::Exposure => self.exposure,
        }
    }

    /// Write one field.
    pub fn set(&mut self, field: SkyField, value: f32) {
        let slot = match field {
            SkyField::Turbidity => &mut self.turbidity,
            SkyField::Rayleigh => &mut self.rayleigh,
            SkyField::MieCoefficient => &mut self.mie_coefficient,
            SkyField::MieDirectionalG => &mut self.mie_directional_g,
            SkyField::Elevation => &mut self.elevation,
            SkyField::Azimuth => &mut self.azimuth,
            SkyField::Exposure => &mut self.exposure,
        };
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = SkyParameters::default();
        assert_eq!(p.turbidity, 30.0);
        assert_eq!(p.rayleigh, 1.492);
        assert_eq!(p.mie_coefficient, 0.001);
        assert_eq!(p.mie_directional_g, 0.705);
        assert_eq!(p.elevation, 10.3);
        assert_eq!(p.azimuth, 153.4);
        assert_eq!(p.exposure, 1.0);
    }

    #[test]
    fn test_get_set_every_field() {
        let mut p = SkyParameters::default();
        for (i, field) in SkyField::ALL.iter().enumerate() {
            p.set(*field, i as f32 + 0.5);
        }
        for (i, field) in SkyField::ALL.iter().enumerate() {
            assert_eq!(p.get(*field), i as f32 + 0.5, "{}", field.name());
        }
    }

    #[test]
    fn test_field_names_unique() {
        let mut names: Vec<_> = SkyField::ALL.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SkyField::ALL.len());
    }
}
