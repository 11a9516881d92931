//! Configuration options for shadow rendering.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Global configuration options for the shadow pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowOptions {
    /// Minimum number of stencil bits the device must provide.
    ///
    /// Devices with fewer bits fall back to ambient-only lighting.
    pub required_stencil_bits: u8,

    /// Whether to trace every sub-pass in the log.
    pub pass_debug: bool,

    /// Whether to cull structures whose bounds are outside the view frustum.
    ///
    /// Never applied while building the stencil: an off-screen occluder can
    /// still cast an on-screen shadow.
    pub frustum_culling: bool,

    /// Use wrapping stencil increment/decrement instead of clamping.
    pub stencil_wrap: bool,

    /// Optional debug sub-renders.
    pub debug: ShadowDebugOptions,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            required_stencil_bits: 1,
            pass_debug: false,
            frustum_culling: true,
            stencil_wrap: false,
            debug: ShadowDebugOptions::default(),
        }
    }
}

impl ShadowOptions {
    /// Parses options from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Saves options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Switches for diagnosing shadow volumes on screen.
///
/// All default to off, which gives the normal shadowed render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ShadowDebugOptions {
    /// Render volumes with a zero stencil write mask.
    pub no_stencil: bool,
    /// Skip the increment (front face) pass.
    pub no_front_faces: bool,
    /// Skip the decrement (back face) pass.
    pub no_back_faces: bool,
    /// Skip the light-facing caps.
    pub no_caps: bool,
    /// Skip the extruded silhouette sides.
    pub no_edges: bool,
    /// Skip the boots projected to infinity.
    pub no_boots: bool,
    /// Write the increment pass to green and the decrement pass to red.
    pub show_volume: bool,
    /// Draw silhouette edges as lines.
    pub show_silhouette: bool,
}

impl ShadowDebugOptions {
    /// Returns true if any debug switch is set.
    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}
