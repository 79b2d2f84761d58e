// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::Result;

/// Settings that control how assets are written. Missing keys take their default value when loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Block compress textures (DXT1/DXT5) when their dimensions allow it.
    pub compress_textures: bool,
    /// Encode cubemap faces from linear to sRGB before writing them.
    pub cubemap_srgb: bool,
    /// Prepended to texture names referenced by materials.
    pub texture_prefix: String,
    /// Prepended to technique names referenced by materials.
    pub technique_prefix: String,
    /// Vertices with a lower weight than this don't contribute to a bone's bounds.
    pub bone_weight_threshold: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            compress_textures: true,
            cubemap_srgb: false,
            texture_prefix: "Textures/".to_string(),
            technique_prefix: "Techniques/".to_string(),
            bone_weight_threshold: 0.01,
        }
    }
}

impl ExportSettings {
    /// Parses settings from a JSON document.
    pub fn from_json(json: &str) -> Result<ExportSettings> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes these settings into a JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
