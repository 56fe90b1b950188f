//! Material descriptions for the planet surface and atmosphere shell.
//!
//! Both materials hold the same `Rc<LightingParams>` and `Rc<TextureSet>`, so
//! there is exactly one sun direction and one set of textures in the scene.
//! Backends mirror this by binding a single lighting buffer and texture bind
//! group to both pipelines.

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use terra_config::AssetConfig;

use crate::lighting::LightingParams;

/// One of the three textures sampled by the globe programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// Daylight albedo.
    Day,
    /// City lights, shown on the unlit hemisphere.
    Night,
    /// Red channel is the ocean specular mask, green is cloud cover.
    SpecularClouds,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 3] = [Self::Day, Self::Night, Self::SpecularClouds];

    /// Uniform name the programs bind this texture under.
    pub fn uniform_name(self) -> &'static str {
        match self {
            Self::Day => "uDayTexture",
            Self::Night => "uNightTexture",
            Self::SpecularClouds => "uSpectacularCloudsTexture",
        }
    }

    /// Color data is sRGB encoded; the mask holds plain coverage values.
    pub fn color_space(self) -> ColorSpace {
        match self {
            Self::Day | Self::Night => ColorSpace::Srgb,
            Self::SpecularClouds => ColorSpace::Linear,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Day => 0,
            Self::Night => 1,
            Self::SpecularClouds => 2,
        }
    }
}

impl fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "day",
            Self::Night => "night",
            Self::SpecularClouds => "specular/clouds",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

/// A texture to load: where it lives and how to sample it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub slot: TextureSlot,
    pub path: PathBuf,
    pub color_space: ColorSpace,
    /// Anisotropic filtering level, 1 when unsupported.
    pub anisotropy: u16,
}

/// The three globe textures, indexed by [`TextureSlot`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSet {
    descs: [TextureDesc; 3],
}

impl TextureSet {
    /// Describe the configured textures at the backend's anisotropy limit.
    pub fn from_assets(assets: &AssetConfig, max_anisotropy: u16) -> Self {
        let anisotropy = max_anisotropy.max(1);
        let desc = |slot: TextureSlot, path: &PathBuf| TextureDesc {
            slot,
            path: path.clone(),
            color_space: slot.color_space(),
            anisotropy,
        };
        Self {
            descs: [
                desc(TextureSlot::Day, &assets.day_texture),
                desc(TextureSlot::Night, &assets.night_texture),
                desc(TextureSlot::SpecularClouds, &assets.specular_clouds_texture),
            ],
        }
    }

    pub fn get(&self, slot: TextureSlot) -> &TextureDesc {
        &self.descs[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextureDesc> {
        self.descs.iter()
    }
}

/// Which faces a material draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

/// Render state and shared uniforms for one globe mesh.
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    pub name: &'static str,
    pub side: Side,
    pub transparent: bool,
    pub depth_write: bool,
    /// Scales the output alpha. Only the atmosphere program reads it.
    pub opacity: f32,
    pub lighting: Rc<LightingParams>,
    pub textures: Rc<TextureSet>,
}

/// The planet and atmosphere materials plus the resources they share.
#[derive(Debug, Clone)]
pub struct ShadingPipeline {
    lighting: Rc<LightingParams>,
    textures: Rc<TextureSet>,
    planet: MaterialDesc,
    atmosphere: MaterialDesc,
}

impl ShadingPipeline {
    pub fn new(textures: TextureSet, lighting: LightingParams) -> Self {
        let lighting = Rc::new(lighting);
        let textures = Rc::new(textures);

        let planet = MaterialDesc {
            name: "planet",
            side: Side::Front,
            transparent: true,
            depth_write: true,
            opacity: 1.0,
            lighting: Rc::clone(&lighting),
            textures: Rc::clone(&textures),
        };
        let atmosphere = MaterialDesc {
            name: "atmosphere",
            side: Side::Back,
            transparent: true,
            depth_write: false,
            opacity: 1.0,
            lighting: Rc::clone(&lighting),
            textures: Rc::clone(&textures),
        };

        Self {
            lighting,
            textures,
            planet,
            atmosphere,
        }
    }

    pub fn lighting(&self) -> &LightingParams {
        &self.lighting
    }

    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }

    pub fn planet(&self) -> &MaterialDesc {
        &self.planet
    }

    pub fn atmosphere(&self) -> &MaterialDesc {
        &self.atmosphere
    }

    /// Set the atmosphere's opacity uniform, clamped to `[0, 1]`.
    pub fn set_atmosphere_opacity(&mut self, opacity: f32) {
        self.atmosphere.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> ShadingPipeline {
        ShadingPipeline::new(
            TextureSet::from_assets(&AssetConfig::default(), 16),
            LightingParams::default(),
        )
    }

    #[test]
    fn test_materials_share_lighting_and_textures() {
        let shading = pipeline();
        assert!(Rc::ptr_eq(
            &shading.planet().lighting,
            &shading.atmosphere().lighting
        ));
        assert!(Rc::ptr_eq(
            &shading.planet().textures,
            &shading.atmosphere().textures
        ));
    }

    #[test]
    fn test_planet_render_state() {
        let shading = pipeline();
        let planet = shading.planet();
        assert_eq!(planet.side, Side::Front);
        assert!(planet.transparent);
        assert!(planet.depth_write);
    }

    #[test]
    fn test_atmosphere_render_state() {
        let shading = pipeline();
        let atmosphere = shading.atmosphere();
        assert_eq!(atmosphere.side, Side::Back);
        assert!(atmosphere.transparent);
        assert!(!atmosphere.depth_write);
        assert_eq!(atmosphere.opacity, 1.0);
    }

    #[test]
    fn test_texture_color_spaces() {
        let shading = pipeline();
        let textures = shading.textures();
        assert_eq!(textures.get(TextureSlot::Day).color_space, ColorSpace::Srgb);
        assert_eq!(textures.get(TextureSlot::Night).color_space, ColorSpace::Srgb);
        assert_eq!(
            textures.get(TextureSlot::SpecularClouds).color_space,
            ColorSpace::Linear
        );
    }

    #[test]
    fn test_anisotropy_applied_to_every_texture() {
        let set = TextureSet::from_assets(&AssetConfig::default(), 8);
        assert!(set.iter().all(|desc| desc.anisotropy == 8));
        let unsupported = TextureSet::from_assets(&AssetConfig::default(), 0);
        assert!(unsupported.iter().all(|desc| desc.anisotropy == 1));
    }

    #[test]
    fn test_slot_lookup_matches_paths() {
        let assets = AssetConfig::default();
        let set = TextureSet::from_assets(&assets, 1);
        assert_eq!(set.get(TextureSlot::Night).path, assets.night_texture);
        for slot in TextureSlot::ALL {
            assert_eq!(set.get(slot).slot, slot);
        }
    }

    #[test]
    fn test_atmosphere_opacity_clamped() {
        let mut shading = pipeline();
        shading.set_atmosphere_opacity(2.0);
        assert_eq!(shading.atmosphere().opacity, 1.0);
        shading.set_atmosphere_opacity(-1.0);
        assert_eq!(shading.atmosphere().opacity, 0.0);
        shading.set_atmosphere_opacity(0.4);
        assert_eq!(shading.atmosphere().opacity, 0.4);
    }
}
