//! sRGB colors as authored in hex, with conversion to linear for shading.

/// An sRGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Build from linear components, e.g. a glTF base color factor.
    pub fn from_linear(linear: [f32; 3]) -> Self {
        Self::new(
            linear_to_srgb(linear[0]),
            linear_to_srgb(linear[1]),
            linear_to_srgb(linear[2]),
        )
    }

    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Linear-light components for the shader.
    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_channels() {
        let c = Color::from_hex(0x243c4c);
        assert!((c.r - 0x24 as f32 / 255.0).abs() < 1e-6);
        assert!((c.g - 0x3c as f32 / 255.0).abs() < 1e-6);
        assert!((c.b - 0x4c as f32 / 255.0).abs() < 1e-6);
        assert_eq!(c.to_hex(), 0x243c4c);
    }

    #[test]
    fn test_linear_conversion_endpoints() {
        assert_eq!(Color::WHITE.to_linear(), [1.0, 1.0, 1.0]);
        assert_eq!(Color::new(0.0, 0.0, 0.0).to_linear(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_linear_is_darker_in_midtones() {
        let lin = Color::from_hex(0x8194a4).to_linear();
        let srgb = Color::from_hex(0x8194a4);
        assert!(lin[0] < srgb.r && lin[1] < srgb.g && lin[2] < srgb.b);
    }

    #[test]
    fn test_from_linear_inverts_to_linear() {
        let c = Color::from_hex(0x8194a4);
        let back = Color::from_linear(c.to_linear());
        assert_eq!(back.to_hex(), 0x8194a4);
    }
}
