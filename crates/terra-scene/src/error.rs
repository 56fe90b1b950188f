//! Error taxonomy shared by the scene core and its render backends.

use std::path::PathBuf;

use crate::material::TextureSlot;

/// Failures surfaced by mounting or running a [`GlobeView`](crate::GlobeView).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GlobeError {
    /// The host did not provide a drawing surface.
    #[error("no drawing surface was provided")]
    MissingSurface,

    /// A shader program failed to parse or validate.
    #[error("shader `{name}` failed to compile: {message}")]
    ShaderCompileFailure { name: String, message: String },

    /// A texture could not be read or decoded. The placeholder stays bound.
    #[error("failed to load {slot} texture from {}: {reason}", path.display())]
    AssetLoadFailure {
        slot: TextureSlot,
        path: PathBuf,
        reason: String,
    },

    /// The graphics context was lost or destroyed.
    #[error("graphics context lost: {reason}")]
    ContextLoss { reason: String },

    /// Any other backend construction failure (adapter, device, surface).
    #[error("render backend error: {message}")]
    Backend { message: String },
}

impl GlobeError {
    /// Whether this error aborts mounting.
    ///
    /// Asset failures degrade to placeholders and context loss is handled by
    /// stopping the render loop, so neither is fatal to construction.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingSurface | Self::ShaderCompileFailure { .. } | Self::Backend { .. }
        )
    }
}

/// Per-frame failure returned by [`RenderBackend::render`](crate::RenderBackend::render).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame could not be acquired (timeout, outdated surface). Try again next tick.
    #[error("frame skipped")]
    Skipped,
    /// The device is gone. No further frames can be drawn.
    #[error("graphics context lost")]
    ContextLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(GlobeError::MissingSurface.is_fatal());
        assert!(
            GlobeError::ShaderCompileFailure {
                name: "planet.frag".into(),
                message: "expected `;`".into(),
            }
            .is_fatal()
        );
        assert!(
            !GlobeError::AssetLoadFailure {
                slot: TextureSlot::Night,
                path: "night.jpg".into(),
                reason: "not found".into(),
            }
            .is_fatal()
        );
        assert!(
            !GlobeError::ContextLoss {
                reason: "destroyed".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_asset_failure_message_names_slot_and_path() {
        let err = GlobeError::AssetLoadFailure {
            slot: TextureSlot::SpecularClouds,
            path: PathBuf::from("assets/earth/specularClouds.jpg"),
            reason: "unsupported format".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("specular/clouds"));
        assert!(msg.contains("assets/earth/specularClouds.jpg"));
        assert!(msg.contains("unsupported format"));
    }
}
