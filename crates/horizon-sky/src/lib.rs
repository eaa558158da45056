//! Atmospheric sky model: user-facing parameters, sun direction, derived
//! Rayleigh/Mie scattering terms, and the debug panel that edits them.
//!
//! [`SkyParameterModel`] owns the [`SkyParameters`] and pushes them into any
//! [`SkyTarget`] (a scene plus renderer) through
//! [`SkyParameterModel::apply_and_render`].

mod model;
mod panel;
mod params;
mod scattering;
mod sun;

pub use model::{PINNED_SCATTERING, ScatteringBinding, SkyParameterModel, SkyTarget};
pub use panel::{DebugPanel, SliderControl};
pub use params::{SkyField, SkyParameters};
pub use scattering::{DerivedScattering, Sky, SkyGpuUniform, SkyUniforms};
pub use sun::sun_direction;
