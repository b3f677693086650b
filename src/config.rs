//! Engine configuration.
//!
//! Recognised options mirror the construction surface an embedder passes in:
//! `{ stave: {space}, renderer: {width, height, background}, font: {face, point, style} }`.
//! The render surface itself is not serialisable and is supplied separately
//! through [`Session::set_context`](crate::pipeline::Session::set_context).
//! These values only seed default geometry; layout correctness never depends
//! on them.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Result};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stave: StaveConfig,
    pub renderer: RendererConfig,
    pub font: FontConfig,
    pub layout: LayoutOptions,
    pub debug: DebugFlags,
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConfigurationError::InvalidConfig(e.to_string()).into())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigurationError::InvalidConfig(e.to_string()).into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaveConfig {
    /// Distance between adjacent staff lines
    pub space: f64,
}

impl Default for StaveConfig {
    fn default() -> Self {
        Self { space: 10.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub width: f64,
    pub height: f64,
    pub background: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { width: 500.0, height: 200.0, background: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub face: String,
    pub point: f64,
    pub style: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            face: "Times New Roman, serif".into(),
            point: 10.0,
            style: "normal".into(),
        }
    }
}

/// Spacing knobs shared by the formatter and modifier contexts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Extra width added to every modifier context after its categories ran
    pub modifier_context_spacing: f64,
    /// Gap between consecutive modifier columns of one category
    pub modifier_spacing: f64,
    /// Padding between stave start and first stave modifier, and before stave end
    pub stave_padding: f64,
    /// Padding after each begin-of-stave modifier
    pub stave_modifier_padding: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            modifier_context_spacing: 0.0,
            modifier_spacing: 1.0,
            stave_padding: 10.0,
            stave_modifier_padding: 10.0,
        }
    }
}

/// Per-session debug logging switches.
///
/// Each flag enables `log::debug!`/`log::trace!` output for one stage. The
/// flags travel with the session instead of living in global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugFlags {
    pub formatter: bool,
    pub modifiers: bool,
    pub pipeline: bool,
}

impl DebugFlags {
    pub fn all() -> Self {
        Self { formatter: true, modifiers: true, pipeline: true }
    }
}
