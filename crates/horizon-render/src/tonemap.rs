//! Tone mapping operators, on the CPU and as a WGSL snippet.
//!
//! [`TONEMAP_WGSL`] is prepended to every shader that writes to the surface.
//! The CPU functions mirror it exactly and are what the tests check.

use glam::{Mat3, Vec3};
use horizon_scene::ToneMapping;

/// ACES input matrix (sRGB => AP1 with RRT saturation), column-major.
const ACES_INPUT: Mat3 = Mat3::from_cols_array(&[
    0.59719, 0.07600, 0.02840, //
    0.35458, 0.90834, 0.13383, //
    0.04823, 0.01566, 0.83777,
]);

/// ACES output matrix (ODT => sRGB), column-major.
const ACES_OUTPUT: Mat3 = Mat3::from_cols_array(&[
    1.60475, -0.10208, -0.00327, //
    -0.53108, 1.10813, -0.07276, //
    -0.07367, -0.00605, 1.07602,
]);

fn rrt_and_odt_fit(v: Vec3) -> Vec3 {
    let a = v * (v + 0.024_578_6) - 0.000_090_537;
    let b = v * (0.983_729 * v + 0.432_951) + 0.238_081;
    a / b
}

/// Fitted ACES filmic curve. The exposure is divided by 0.6 so that an
/// exposure of 1 matches the usual look.
pub fn aces_filmic(color: Vec3, exposure: f32) -> Vec3 {
    let c = color * (exposure / 0.6);
    let c = ACES_OUTPUT * rrt_and_odt_fit(ACES_INPUT * c);
    c.clamp(Vec3::ZERO, Vec3::ONE)
}

/// Apply `mode` to a linear HDR color.
pub fn tone_map(color: Vec3, exposure: f32, mode: ToneMapping) -> Vec3 {
    match mode {
        ToneMapping::None => color,
        ToneMapping::Linear => (color * exposure).clamp(Vec3::ZERO, Vec3::ONE),
        ToneMapping::AcesFilmic => aces_filmic(color, exposure),
    }
}

/// WGSL version of [`tone_map`]; `mode` is [`ToneMapping::shader_index`].
pub const TONEMAP_WGSL: &str = r#"
fn rrt_and_odt_fit(v: vec3<f32>) -> vec3<f32> {
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (0.983729 * v + 0.4329510) + 0.238081;
    return a / b;
}

fn aces_filmic(color: vec3<f32>, exposure: f32) -> vec3<f32> {
    let aces_input = mat3x3<f32>(
        vec3<f32>(0.59719, 0.07600, 0.02840),
        vec3<f32>(0.35458, 0.90834, 0.13383),
        vec3<f32>(0.04823, 0.01566, 0.83777),
    );
    let aces_output = mat3x3<f32>(
        vec3<f32>(1.60475, -0.10208, -0.00327),
        vec3<f32>(-0.53108, 1.10813, -0.07276),
        vec3<f32>(-0.07367, -0.00605, 1.07602),
    );
    var c = color * (exposure / 0.6);
    c = aces_output * rrt_and_odt_fit(aces_input * c);
    return clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
}

fn tone_map(color: vec3<f32>, exposure: f32, mode: u32) -> vec3<f32> {
    switch mode {
        case 1u: {
            return clamp(color * exposure, vec3<f32>(0.0), vec3<f32>(1.0));
        }
        case 2u: {
            return aces_filmic(color, exposure);
        }
        default: {
            return color;
        }
    }
}
"#;
