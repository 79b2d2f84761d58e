// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::{BTreeMap, HashMap};

use glam::Vec4;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::{Error, Result};

const BUILTIN_SEMANTICS: &str = include_str!("../resources/shader_semantics.json");

/// What a shader property is used for, independent of what the shader calls it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Semantic {
    BaseColorMap,
    BaseColor,
    MetallicGlossMap,
    Metallic,
    Smoothness,
    SmoothnessScale,
    SpecularGlossMap,
    SpecularColor,
    BumpMap,
    BumpScale,
    OcclusionMap,
    OcclusionStrength,
    EmissionMap,
    EmissionColor,
    ParallaxMap,
    ParallaxScale,
    AlphaCutoff,
    RenderMode,
    Shininess,
    DetailAlbedoMap,
    DetailNormalMap,
    SkyboxCubemap,
    SkyboxFront,
    SkyboxBack,
    SkyboxLeft,
    SkyboxRight,
    SkyboxUp,
    SkyboxDown,
    Tint,
    Exposure,
    Rotation,
}

/// Which argument bag a shader family fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderKind {
    MetallicGlossiness,
    SpecularGlossiness,
    Legacy,
    Skybox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderFamily {
    pub kind: ShaderKind,
    /// Shaders whose name starts with one of these belong to this family.
    pub shader_prefixes: Vec<String>,
    /// Property name to semantic.
    pub properties: HashMap<String, Semantic>,
}

/// Maps (shader family, property name) to a semantic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticTable {
    /// Keyed by family name. Equally long prefixes resolve to the first family in name order.
    pub families: BTreeMap<String, ShaderFamily>,
    /// Family used for shaders that match no prefix.
    pub fallback: Option<String>,
}

impl SemanticTable {
    /// The table for the built-in shaders of the source editor.
    pub fn builtin() -> Result<SemanticTable> {
        Self::from_json(BUILTIN_SEMANTICS)
    }

    /// Parses a table from a JSON document.
    pub fn from_json(json: &str) -> Result<SemanticTable> {
        let table: SemanticTable = serde_json::from_str(json)?;

        if let Some(fallback) = &table.fallback {
            if !table.families.contains_key(fallback) {
                return Err(Error::invalid(format!(
                    "fallback shader family {fallback:?} isn't defined"
                )));
            }
        }

        Ok(table)
    }

    /// The family with the longest prefix matching `shader_name`, or the fallback family.
    pub fn family_for(&self, shader_name: &str) -> Option<(&str, &ShaderFamily)> {
        let mut best: Option<(&str, &ShaderFamily, usize)> = None;

        for (name, family) in &self.families {
            for prefix in &family.shader_prefixes {
                if shader_name.starts_with(prefix.as_str())
                    && best.map_or(true, |(_, _, len)| prefix.len() > len)
                {
                    best = Some((name, family, prefix.len()));
                }
            }
        }

        match best {
            Some((name, family, _)) => Some((name, family)),
            None => {
                let fallback = self.fallback.as_deref()?;
                self.families
                    .get(fallback)
                    .map(|family| (fallback, family))
            }
        }
    }

    /// Fills the argument bag matching `shader_name` from `properties`.
    pub fn arguments(&self, shader_name: &str, properties: &PropertyBag) -> Result<ShaderArguments> {
        let (family_name, family) = self.family_for(shader_name).ok_or_else(|| {
            Error::invalid(format!("no shader family handles {shader_name:?}"))
        })?;

        trace!(shader = shader_name, family = family_name, "Resolved shader family");

        let mut arguments = ShaderArguments::new(family.kind, shader_name);

        for (name, value) in properties.iter() {
            match family.properties.get(name) {
                Some(semantic) => {
                    if !arguments.apply(*semantic, value) {
                        warn!(
                            shader = shader_name,
                            property = name,
                            ?semantic,
                            "Property value doesn't fit its semantic, ignoring"
                        );
                    }
                }
                None => trace!(shader = shader_name, property = name, "Unmapped property"),
            }
        }

        Ok(arguments)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Path of a texture asset
    Texture(String),
    /// Linear RGBA
    Color(Vec4),
    Float(f32),
}

/// Material properties as read from the source asset.
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    properties: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) -> &mut Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn set_texture(&mut self, name: impl Into<String>, path: impl Into<String>) -> &mut Self {
        self.set(name, PropertyValue::Texture(path.into()))
    }

    pub fn set_color(&mut self, name: impl Into<String>, color: Vec4) -> &mut Self {
        self.set(name, PropertyValue::Color(color))
    }

    pub fn set_float(&mut self, name: impl Into<String>, value: f32) -> &mut Self {
        self.set(name, PropertyValue::Float(value))
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Blend mode of the standard shaders, stored as a float property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Opaque,
    Cutout,
    Fade,
    Transparent,
}

impl RenderMode {
    fn from_float(value: f32) -> RenderMode {
        match value.round() as i32 {
            1 => RenderMode::Cutout,
            2 => RenderMode::Fade,
            3 => RenderMode::Transparent,
            _ => RenderMode::Opaque,
        }
    }

    /// Whether the material needs alpha blending.
    pub fn is_blended(self) -> bool {
        matches!(self, RenderMode::Fade | RenderMode::Transparent)
    }
}

/// Inputs shared by both physically based workflows.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceArguments {
    pub bump_map: Option<String>,
    pub bump_scale: f32,
    pub occlusion_map: Option<String>,
    pub occlusion_strength: f32,
    pub emission_map: Option<String>,
    pub emission_color: Vec4,
    pub parallax_map: Option<String>,
    pub parallax_scale: f32,
    pub alpha_cutoff: f32,
    pub render_mode: RenderMode,
    pub detail_albedo_map: Option<String>,
    pub detail_normal_map: Option<String>,
}

impl Default for SurfaceArguments {
    fn default() -> Self {
        Self {
            bump_map: None,
            bump_scale: 1.0,
            occlusion_map: None,
            occlusion_strength: 1.0,
            emission_map: None,
            emission_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            parallax_map: None,
            parallax_scale: 0.02,
            alpha_cutoff: 0.5,
            render_mode: RenderMode::Opaque,
            detail_albedo_map: None,
            detail_normal_map: None,
        }
    }
}

impl SurfaceArguments {
    fn apply(&mut self, semantic: Semantic, value: &PropertyValue) -> bool {
        match (semantic, value) {
            (Semantic::BumpMap, PropertyValue::Texture(t)) => self.bump_map = Some(t.clone()),
            (Semantic::BumpScale, PropertyValue::Float(f)) => self.bump_scale = *f,
            (Semantic::OcclusionMap, PropertyValue::Texture(t)) => {
                self.occlusion_map = Some(t.clone())
            }
            (Semantic::OcclusionStrength, PropertyValue::Float(f)) => self.occlusion_strength = *f,
            (Semantic::EmissionMap, PropertyValue::Texture(t)) => {
                self.emission_map = Some(t.clone())
            }
            (Semantic::EmissionColor, PropertyValue::Color(c)) => self.emission_color = *c,
            (Semantic::ParallaxMap, PropertyValue::Texture(t)) => {
                self.parallax_map = Some(t.clone())
            }
            (Semantic::ParallaxScale, PropertyValue::Float(f)) => self.parallax_scale = *f,
            (Semantic::AlphaCutoff, PropertyValue::Float(f)) => self.alpha_cutoff = *f,
            (Semantic::RenderMode, PropertyValue::Float(f)) => {
                self.render_mode = RenderMode::from_float(*f)
            }
            (Semantic::DetailAlbedoMap, PropertyValue::Texture(t)) => {
                self.detail_albedo_map = Some(t.clone())
            }
            (Semantic::DetailNormalMap, PropertyValue::Texture(t)) => {
                self.detail_normal_map = Some(t.clone())
            }
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetallicGlossinessShaderArguments {
    pub base_map: Option<String>,
    pub base_color: Vec4,
    /// Metallic in red, smoothness in alpha
    pub metallic_gloss_map: Option<String>,
    pub metallic: f32,
    pub smoothness: f32,
    pub smoothness_scale: f32,
    pub surface: SurfaceArguments,
}

impl Default for MetallicGlossinessShaderArguments {
    fn default() -> Self {
        Self {
            base_map: None,
            base_color: Vec4::ONE,
            metallic_gloss_map: None,
            metallic: 0.0,
            smoothness: 0.5,
            smoothness_scale: 1.0,
            surface: SurfaceArguments::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecularGlossinessShaderArguments {
    pub diffuse_map: Option<String>,
    pub diffuse_color: Vec4,
    /// Specular in rgb, smoothness in alpha
    pub specular_gloss_map: Option<String>,
    pub specular_color: Vec4,
    pub smoothness: f32,
    pub smoothness_scale: f32,
    pub surface: SurfaceArguments,
}

impl Default for SpecularGlossinessShaderArguments {
    fn default() -> Self {
        Self {
            diffuse_map: None,
            diffuse_color: Vec4::ONE,
            specular_gloss_map: None,
            specular_color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            smoothness: 0.5,
            smoothness_scale: 1.0,
            surface: SurfaceArguments::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyShaderArguments {
    pub diffuse_map: Option<String>,
    pub diffuse_color: Vec4,
    pub bump_map: Option<String>,
    pub specular_color: Vec4,
    pub shininess: f32,
    pub emission_map: Option<String>,
    pub emission_color: Vec4,
    pub alpha_cutoff: Option<f32>,
    /// Set for the "Transparent/" family of legacy shaders
    pub transparent: bool,
}

impl Default for LegacyShaderArguments {
    fn default() -> Self {
        Self {
            diffuse_map: None,
            diffuse_color: Vec4::ONE,
            bump_map: None,
            specular_color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            shininess: 0.078125,
            emission_map: None,
            emission_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            alpha_cutoff: None,
            transparent: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkyboxShaderArguments {
    pub cubemap: Option<String>,
    /// Six-sided skyboxes, front back left right up down
    pub faces: [Option<String>; 6],
    pub tint: Vec4,
    pub exposure: f32,
    /// Degrees around the up axis
    pub rotation: f32,
}

impl Default for SkyboxShaderArguments {
    fn default() -> Self {
        Self {
            cubemap: None,
            faces: Default::default(),
            tint: Vec4::new(0.5, 0.5, 0.5, 0.5),
            exposure: 1.0,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderArguments {
    MetallicGlossiness(MetallicGlossinessShaderArguments),
    SpecularGlossiness(SpecularGlossinessShaderArguments),
    Legacy(LegacyShaderArguments),
    Skybox(SkyboxShaderArguments),
}

impl ShaderArguments {
    /// An argument bag with every input at the shader's default.
    pub fn new(kind: ShaderKind, shader_name: &str) -> Self {
        match kind {
            ShaderKind::MetallicGlossiness => {
                ShaderArguments::MetallicGlossiness(Default::default())
            }
            ShaderKind::SpecularGlossiness => {
                ShaderArguments::SpecularGlossiness(Default::default())
            }
            ShaderKind::Legacy => ShaderArguments::Legacy(LegacyShaderArguments {
                transparent: shader_name.contains("Transparent/"),
                ..Default::default()
            }),
            ShaderKind::Skybox => ShaderArguments::Skybox(Default::default()),
        }
    }

    /// Stores `value` in the input `semantic` refers to. Returns false if this bag has no such input or the value has the wrong type.
    pub fn apply(&mut self, semantic: Semantic, value: &PropertyValue) -> bool {
        match self {
            ShaderArguments::MetallicGlossiness(args) => match (semantic, value) {
                (Semantic::BaseColorMap, PropertyValue::Texture(t)) => {
                    args.base_map = Some(t.clone())
                }
                (Semantic::BaseColor, PropertyValue::Color(c)) => args.base_color = *c,
                (Semantic::MetallicGlossMap, PropertyValue::Texture(t)) => {
                    args.metallic_gloss_map = Some(t.clone())
                }
                (Semantic::Metallic, PropertyValue::Float(f)) => args.metallic = *f,
                (Semantic::Smoothness, PropertyValue::Float(f)) => args.smoothness = *f,
                (Semantic::SmoothnessScale, PropertyValue::Float(f)) => {
                    args.smoothness_scale = *f
                }
                _ => return args.surface.apply(semantic, value),
            },
            ShaderArguments::SpecularGlossiness(args) => match (semantic, value) {
                (Semantic::BaseColorMap, PropertyValue::Texture(t)) => {
                    args.diffuse_map = Some(t.clone())
                }
                (Semantic::BaseColor, PropertyValue::Color(c)) => args.diffuse_color = *c,
                (Semantic::SpecularGlossMap, PropertyValue::Texture(t)) => {
                    args.specular_gloss_map = Some(t.clone())
                }
                (Semantic::SpecularColor, PropertyValue::Color(c)) => args.specular_color = *c,
                (Semantic::Smoothness, PropertyValue::Float(f)) => args.smoothness = *f,
                (Semantic::SmoothnessScale, PropertyValue::Float(f)) => {
                    args.smoothness_scale = *f
                }
                _ => return args.surface.apply(semantic, value),
            },
            ShaderArguments::Legacy(args) => match (semantic, value) {
                (Semantic::BaseColorMap, PropertyValue::Texture(t)) => {
                    args.diffuse_map = Some(t.clone())
                }
                (Semantic::BaseColor, PropertyValue::Color(c)) => args.diffuse_color = *c,
                (Semantic::BumpMap, PropertyValue::Texture(t)) => args.bump_map = Some(t.clone()),
                (Semantic::SpecularColor, PropertyValue::Color(c)) => args.specular_color = *c,
                (Semantic::Shininess, PropertyValue::Float(f)) => args.shininess = *f,
                (Semantic::EmissionMap, PropertyValue::Texture(t)) => {
                    args.emission_map = Some(t.clone())
                }
                (Semantic::EmissionColor, PropertyValue::Color(c)) => args.emission_color = *c,
                (Semantic::AlphaCutoff, PropertyValue::Float(f)) => args.alpha_cutoff = Some(*f),
                _ => return false,
            },
            ShaderArguments::Skybox(args) => {
                let face = match semantic {
                    Semantic::SkyboxFront => Some(0),
                    Semantic::SkyboxBack => Some(1),
                    Semantic::SkyboxLeft => Some(2),
                    Semantic::SkyboxRight => Some(3),
                    Semantic::SkyboxUp => Some(4),
                    Semantic::SkyboxDown => Some(5),
                    _ => None,
                };

                match (semantic, value, face) {
                    (_, PropertyValue::Texture(t), Some(face)) => args.faces[face] = Some(t.clone()),
                    (Semantic::SkyboxCubemap, PropertyValue::Texture(t), _) => {
                        args.cubemap = Some(t.clone())
                    }
                    (Semantic::Tint, PropertyValue::Color(c), _) => args.tint = *c,
                    (Semantic::Exposure, PropertyValue::Float(f), _) => args.exposure = *f,
                    (Semantic::Rotation, PropertyValue::Float(f), _) => args.rotation = *f,
                    _ => return false,
                }
            }
        }
        true
    }
}
