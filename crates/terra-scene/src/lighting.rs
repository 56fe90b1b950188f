//! Sun direction, atmosphere tints, and a CPU mirror of the globe shading.
//!
//! The WGSL programs in the render crate evaluate the same curves per
//! fragment. Keeping a scalar version here lets the blend behaviour be tested
//! without a GPU.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

/// Daylight side atmosphere tint (`#4a96e8`).
pub const ATMOSPHERE_DAY_HEX: u32 = 0x4a96e8;
/// Terminator atmosphere tint (`#1950e5`).
pub const ATMOSPHERE_TWILIGHT_HEX: u32 = 0x1950e5;

/// Spherical coordinates with Y up.
///
/// `phi` is the polar angle from +Y, `theta` the azimuth around Y measured
/// from +Z toward +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub const fn new(radius: f32, phi: f32, theta: f32) -> Self {
        Self { radius, phi, theta }
    }

    pub fn to_cartesian(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Where the sun sits: just above the equator, off to the left of the camera.
pub const SUN_SPHERICAL: Spherical = Spherical::new(1.0, PI * 0.48, -1.8);

/// Linear RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Decode a `0xRRGGBB` sRGB value into linear space.
    pub fn from_srgb_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Parse `#rrggbb` (the leading `#` is optional) as sRGB.
    pub fn parse_srgb(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_srgb_hex)
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// sRGB transfer function, inverse.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

/// Uniform values shared by both globe materials.
///
/// Built once at mount and never mutated, so the planet and atmosphere always
/// agree on the sun direction.
#[derive(Debug, Clone, PartialEq)]
pub struct LightingParams {
    /// Unit vector pointing toward the sun.
    pub sun_direction: Vec3,
    pub atmosphere_day_color: Color,
    pub atmosphere_twilight_color: Color,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            sun_direction: SUN_SPHERICAL.to_cartesian(),
            atmosphere_day_color: Color::from_srgb_hex(ATMOSPHERE_DAY_HEX),
            atmosphere_twilight_color: Color::from_srgb_hex(ATMOSPHERE_TWILIGHT_HEX),
        }
    }
}

/// Hermite smoothstep, matching the GLSL/WGSL builtin for `edge0 < edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

/// Weight of the day texture for a given `dot(normal, sun)`.
pub fn day_mix(sun_orientation: f32) -> f32 {
    smoothstep(-0.25, 0.5, sun_orientation)
}

/// Weight of the day tint over the twilight tint.
pub fn atmosphere_day_mix(sun_orientation: f32) -> f32 {
    smoothstep(-0.5, 1.0, sun_orientation)
}

/// Texel values the surface program samples at one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub day: Vec3,
    pub night: Vec3,
    /// Red = ocean specular mask, green = cloud cover.
    pub specular_clouds: Vec2,
}

impl LightingParams {
    fn atmosphere_color(&self, sun_orientation: f32) -> Vec3 {
        mix(
            self.atmosphere_twilight_color.to_vec3(),
            self.atmosphere_day_color.to_vec3(),
            atmosphere_day_mix(sun_orientation),
        )
    }

    /// Planet surface color.
    ///
    /// `view_direction` points from the camera toward the fragment.
    pub fn shade_surface(&self, normal: Vec3, view_direction: Vec3, sample: SurfaceSample) -> Vec3 {
        let normal = normal.normalize();
        let view_direction = view_direction.normalize();
        let sun_orientation = self.sun_direction.dot(normal);

        let day = day_mix(sun_orientation);
        let mut color = mix(sample.night, sample.day, day);

        let clouds = smoothstep(0.5, 1.0, sample.specular_clouds.y) * day;
        color = mix(color, Vec3::ONE, clouds);

        let fresnel = (view_direction.dot(normal) + 1.0).powi(2);
        let atmosphere_mix = atmosphere_day_mix(sun_orientation);
        let atmosphere_color = self.atmosphere_color(sun_orientation);
        color = mix(color, atmosphere_color, fresnel * atmosphere_mix);

        let reflection = reflect(-self.sun_direction, normal);
        let specular = (-reflection.dot(view_direction)).max(0.0).powf(32.0)
            * sample.specular_clouds.x;
        let specular_color = mix(Vec3::ONE, atmosphere_color, fresnel);

        color + specular * specular_color
    }

    /// Atmosphere shell color and alpha for a back-face fragment.
    pub fn shade_atmosphere(&self, normal: Vec3, view_direction: Vec3, opacity: f32) -> (Vec3, f32) {
        let normal = normal.normalize();
        let sun_orientation = self.sun_direction.dot(normal);
        (
            self.atmosphere_color(sun_orientation),
            atmosphere_alpha(sun_orientation, view_direction.normalize().dot(normal), opacity),
        )
    }
}

/// Rim alpha of the atmosphere shell.
///
/// `edge` is `dot(view_direction, normal)` on a back face: zero at the
/// silhouette and growing toward the far side of the shell.
pub fn atmosphere_alpha(sun_orientation: f32, edge: f32, opacity: f32) -> f32 {
    smoothstep(0.0, 0.5, edge) * smoothstep(-0.5, 0.0, sun_orientation) * opacity
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Vec3 = Vec3::new(0.1, 0.4, 0.2);
    const NIGHT: Vec3 = Vec3::new(0.9, 0.8, 0.3);

    fn clear_sample() -> SurfaceSample {
        SurfaceSample {
            day: DAY,
            night: NIGHT,
            specular_clouds: Vec2::ZERO,
        }
    }

    /// A view direction perpendicular to `normal` and `sun`, so fresnel is 1
    /// and the specular lobe is zero. Used to isolate one term at a time.
    fn grazing_view(normal: Vec3) -> Vec3 {
        normal.any_orthonormal_vector()
    }

    #[test]
    fn test_sun_direction_from_spherical() {
        let sun = LightingParams::default().sun_direction;
        assert!((sun.length() - 1.0).abs() < 1e-6);
        let phi = PI * 0.48;
        let theta = -1.8_f32;
        assert!((sun.x - phi.sin() * theta.sin()).abs() < 1e-6);
        assert!((sun.y - phi.cos()).abs() < 1e-6);
        assert!((sun.z - phi.sin() * theta.cos()).abs() < 1e-6);
        // Slightly above the equator, mostly toward -X.
        assert!(sun.y > 0.0 && sun.y < 0.1);
        assert!(sun.x < -0.9);
    }

    #[test]
    fn test_hex_colors_decode_to_linear() {
        let day = Color::from_srgb_hex(ATMOSPHERE_DAY_HEX);
        assert!((day.r - srgb_to_linear(0x4a as f32 / 255.0)).abs() < 1e-7);
        assert!(day.b > day.g && day.g > day.r);
        assert_eq!(Color::parse_srgb("#1950E5"), Some(Color::from_srgb_hex(0x1950e5)));
        assert_eq!(Color::parse_srgb("1950e5"), Some(Color::from_srgb_hex(0x1950e5)));
        assert_eq!(Color::parse_srgb("#fff"), None);
    }

    #[test]
    fn test_srgb_transfer_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(0.5) < 0.5);
    }

    #[test]
    fn test_day_mix_boundaries() {
        assert_eq!(day_mix(-0.25), 0.0);
        assert_eq!(day_mix(-1.0), 0.0);
        assert_eq!(day_mix(0.5), 1.0);
        assert_eq!(day_mix(1.0), 1.0);
        let mid = day_mix(0.125);
        assert!((mid - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_blend_is_monotonic() {
        let mut previous = day_mix(-1.0);
        for i in 0..=200 {
            let x = -1.0 + i as f32 * 0.01;
            let current = day_mix(x);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_fully_lit_takes_day_texture() {
        let params = LightingParams::default();
        let normal = params.sun_direction;
        let view = grazing_view(normal);
        // With fresnel 1 and full day mix the tint replaces the base color, so
        // compare against a zero-weighted tint by cancelling the atmosphere.
        let mut untinted = params.clone();
        untinted.atmosphere_day_color = Color::new(DAY.x, DAY.y, DAY.z);
        untinted.atmosphere_twilight_color = Color::new(DAY.x, DAY.y, DAY.z);
        let color = untinted.shade_surface(normal, view, clear_sample());
        assert!((color - DAY).length() < 1e-5);
    }

    #[test]
    fn test_unlit_takes_night_texture() {
        let params = LightingParams::default();
        let normal = -params.sun_direction;
        let color = params.shade_surface(normal, grazing_view(normal), clear_sample());
        // atmosphere_day_mix(-1) is zero so no tint is applied on the night side.
        assert!((color - NIGHT).length() < 1e-6);
    }

    #[test]
    fn test_clouds_whiten_day_side_only() {
        let params = LightingParams::default();
        let cloudy = SurfaceSample {
            specular_clouds: Vec2::new(0.0, 1.0),
            ..clear_sample()
        };

        let night_normal = -params.sun_direction;
        let night = params.shade_surface(night_normal, grazing_view(night_normal), cloudy);
        assert!((night - NIGHT).length() < 1e-6);

        let mut untinted = params.clone();
        untinted.atmosphere_day_color = Color::WHITE;
        let day_normal = params.sun_direction;
        let day = untinted.shade_surface(day_normal, grazing_view(day_normal), cloudy);
        assert!((day - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn test_specular_masked_by_red_channel() {
        let params = LightingParams::default();
        let normal = params.sun_direction;
        // Looking straight down the normal at a sun-facing point puts the
        // reflection exactly into the eye.
        let view = -normal;
        let wet = SurfaceSample {
            specular_clouds: Vec2::new(1.0, 0.0),
            ..clear_sample()
        };
        let dry = params.shade_surface(normal, view, clear_sample());
        let shiny = params.shade_surface(normal, view, wet);
        assert!((shiny - dry - Vec3::ONE).length() < 1e-4);
    }

    #[test]
    fn test_atmosphere_alpha_curve() {
        assert_eq!(atmosphere_alpha(1.0, 0.0, 1.0), 0.0);
        assert_eq!(atmosphere_alpha(1.0, 0.5, 1.0), 1.0);
        assert_eq!(atmosphere_alpha(-0.5, 1.0, 1.0), 0.0);
        assert_eq!(atmosphere_alpha(0.3, 0.8, 0.25), 0.25);
    }

    #[test]
    fn test_atmosphere_stable_at_all_angles() {
        let params = LightingParams::default();
        for i in 0..64 {
            let angle = i as f32 / 64.0 * std::f32::consts::TAU;
            let normal = Vec3::new(angle.cos(), 0.3, angle.sin());
            for view in [Vec3::NEG_Z, Vec3::X, Vec3::new(0.2, -0.9, 0.1)] {
                let (color, alpha) = params.shade_atmosphere(normal, view, 1.0);
                assert!(color.is_finite());
                assert!((0.0..=1.0).contains(&alpha));
            }
        }
    }
}
