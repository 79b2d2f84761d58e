// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::borrow::Cow;
use std::path::Path;

use glam::{Vec3, Vec4};
use hard_xml::XmlWrite;
use tracing::{debug, warn};

use crate::common_file_operations::write_float_list;
use crate::config::ExportSettings;
use crate::pbr::{
    convert_to_metallic_roughness, convert_to_specular_glossiness, MetallicRoughness,
    SpecularGlossiness,
};
use crate::shader::{
    LegacyShaderArguments, MetallicGlossinessShaderArguments, ShaderArguments,
    SkyboxShaderArguments, SpecularGlossinessShaderArguments,
};
use crate::technique::{select_technique, TechniqueFlags};
use crate::{ByteBuffer, Error, Result, WritableFile};

/// Technique used by every skybox material.
pub const SKYBOX_TECHNIQUE: &str = "Skybox.xml";

/// Texture slot of the engine's forward renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUnit {
    Diffuse,
    Normal,
    Specular,
    Emissive,
    Environment,
}

impl TextureUnit {
    pub fn name(self) -> &'static str {
        match self {
            TextureUnit::Diffuse => "diffuse",
            TextureUnit::Normal => "normal",
            TextureUnit::Specular => "specular",
            TextureUnit::Emissive => "emissive",
            TextureUnit::Environment => "environment",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTexture {
    pub unit: TextureUnit,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialParameter {
    Color(Vec4),
    Float(f32),
}

/// An engine material: one technique, its textures and shader parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialFile {
    pub flags: TechniqueFlags,
    pub technique: String,
    pub textures: Vec<MaterialTexture>,
    pub parameters: Vec<(String, MaterialParameter)>,
}

#[derive(XmlWrite)]
#[xml(tag = "material")]
struct MaterialXml<'a> {
    #[xml(child = "technique")]
    technique: TechniqueXml<'a>,
    #[xml(child = "texture")]
    textures: Vec<TextureXml<'a>>,
    #[xml(child = "parameter")]
    parameters: Vec<ParameterXml<'a>>,
}

#[derive(XmlWrite)]
#[xml(tag = "technique")]
struct TechniqueXml<'a> {
    #[xml(attr = "name")]
    name: Cow<'a, str>,
}

#[derive(XmlWrite)]
#[xml(tag = "texture")]
struct TextureXml<'a> {
    #[xml(attr = "unit")]
    unit: Cow<'a, str>,
    #[xml(attr = "name")]
    name: Cow<'a, str>,
}

#[derive(XmlWrite)]
#[xml(tag = "parameter")]
struct ParameterXml<'a> {
    #[xml(attr = "name")]
    name: Cow<'a, str>,
    #[xml(attr = "value")]
    value: Cow<'a, str>,
}

/// Name of an exported texture: the source file name with a `.dds` extension, under the texture prefix.
fn texture_name(path: &str, settings: &ExportSettings) -> String {
    let stem = Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path);

    format!("{}{stem}.dds", settings.texture_prefix)
}

fn flags_if(condition: bool, flags: TechniqueFlags) -> TechniqueFlags {
    if condition {
        flags
    } else {
        TechniqueFlags::empty()
    }
}

/// Which technique inputs `arguments` provide.
pub fn technique_flags(arguments: &ShaderArguments) -> TechniqueFlags {
    match arguments {
        ShaderArguments::MetallicGlossiness(args) => {
            flags_if(args.base_map.is_some(), TechniqueFlags::DIFFUSE)
                | flags_if(args.metallic_gloss_map.is_some(), TechniqueFlags::SPECULAR)
                | flags_if(args.surface.bump_map.is_some(), TechniqueFlags::NORMAL)
                | flags_if(args.surface.emission_map.is_some(), TechniqueFlags::EMISSIVE)
                | flags_if(
                    args.surface.render_mode.is_blended() || args.base_color.w < 1.0,
                    TechniqueFlags::ALPHA,
                )
        }
        ShaderArguments::SpecularGlossiness(args) => {
            flags_if(args.diffuse_map.is_some(), TechniqueFlags::DIFFUSE)
                | flags_if(args.specular_gloss_map.is_some(), TechniqueFlags::SPECULAR)
                | flags_if(args.surface.bump_map.is_some(), TechniqueFlags::NORMAL)
                | flags_if(args.surface.emission_map.is_some(), TechniqueFlags::EMISSIVE)
                | flags_if(
                    args.surface.render_mode.is_blended() || args.diffuse_color.w < 1.0,
                    TechniqueFlags::ALPHA,
                )
        }
        ShaderArguments::Legacy(args) => {
            flags_if(args.diffuse_map.is_some(), TechniqueFlags::DIFFUSE)
                | flags_if(args.bump_map.is_some(), TechniqueFlags::NORMAL)
                | flags_if(args.emission_map.is_some(), TechniqueFlags::EMISSIVE)
                | flags_if(
                    args.transparent || args.diffuse_color.w < 1.0,
                    TechniqueFlags::ALPHA,
                )
        }
        ShaderArguments::Skybox(_) => TechniqueFlags::empty(),
    }
}

impl MaterialFile {
    /// Builds the engine material for a set of shader arguments.
    pub fn from_arguments(arguments: &ShaderArguments, settings: &ExportSettings) -> Self {
        let flags = technique_flags(arguments);

        let mut material = match arguments {
            ShaderArguments::Skybox(_) => MaterialFile::new(flags, SKYBOX_TECHNIQUE, settings),
            _ => MaterialFile::new(flags, select_technique(flags), settings),
        };

        match arguments {
            ShaderArguments::MetallicGlossiness(args) => material.metallic(args, settings),
            ShaderArguments::SpecularGlossiness(args) => material.specular(args, settings),
            ShaderArguments::Legacy(args) => material.legacy(args, settings),
            ShaderArguments::Skybox(args) => material.skybox(args, settings),
        }

        debug!(
            technique = %material.technique,
            textures = material.textures.len(),
            "Built material"
        );

        material
    }

    fn new(flags: TechniqueFlags, technique: &str, settings: &ExportSettings) -> Self {
        Self {
            flags,
            technique: format!("{}{technique}", settings.technique_prefix),
            textures: Vec::new(),
            parameters: Vec::new(),
        }
    }

    fn texture(&mut self, unit: TextureUnit, path: Option<&String>, settings: &ExportSettings) {
        if let Some(path) = path {
            self.textures.push(MaterialTexture {
                unit,
                name: texture_name(path, settings),
            });
        }
    }

    fn parameter(&mut self, name: &str, value: MaterialParameter) {
        self.parameters.push((name.to_string(), value));
    }

    fn metallic(&mut self, args: &MetallicGlossinessShaderArguments, settings: &ExportSettings) {
        self.texture(TextureUnit::Diffuse, args.base_map.as_ref(), settings);
        self.texture(TextureUnit::Normal, args.surface.bump_map.as_ref(), settings);
        self.texture(
            TextureUnit::Specular,
            args.metallic_gloss_map.as_ref(),
            settings,
        );
        self.texture(
            TextureUnit::Emissive,
            args.surface.emission_map.as_ref(),
            settings,
        );

        // the map's alpha is scaled instead of the constant when a map is present
        let smoothness = if args.metallic_gloss_map.is_some() {
            args.smoothness_scale
        } else {
            args.smoothness
        };

        let sg = convert_to_specular_glossiness(&MetallicRoughness {
            base_color: args.base_color.truncate(),
            opacity: args.base_color.w,
            metallic: args.metallic,
            roughness: 1.0 - smoothness,
        });

        self.parameter("MatDiffColor", MaterialParameter::Color(args.base_color));
        self.parameter(
            "MatSpecColor",
            MaterialParameter::Color(sg.specular.extend(1.0)),
        );
        self.parameter(
            "MatEmissiveColor",
            MaterialParameter::Color(emissive_color(
                args.surface.emission_map.is_some(),
                args.surface.emission_color,
            )),
        );
        self.parameter("Metallic", MaterialParameter::Float(args.metallic));
        self.parameter("Roughness", MaterialParameter::Float(1.0 - smoothness));
    }

    fn specular(&mut self, args: &SpecularGlossinessShaderArguments, settings: &ExportSettings) {
        self.texture(TextureUnit::Diffuse, args.diffuse_map.as_ref(), settings);
        self.texture(TextureUnit::Normal, args.surface.bump_map.as_ref(), settings);
        self.texture(
            TextureUnit::Specular,
            args.specular_gloss_map.as_ref(),
            settings,
        );
        self.texture(
            TextureUnit::Emissive,
            args.surface.emission_map.as_ref(),
            settings,
        );

        let glossiness = if args.specular_gloss_map.is_some() {
            args.smoothness_scale
        } else {
            args.smoothness
        };

        let mr = convert_to_metallic_roughness(&SpecularGlossiness {
            diffuse: args.diffuse_color.truncate(),
            opacity: args.diffuse_color.w,
            specular: args.specular_color.truncate(),
            glossiness,
        });

        self.parameter(
            "MatDiffColor",
            MaterialParameter::Color(mr.base_color.extend(mr.opacity)),
        );
        self.parameter(
            "MatSpecColor",
            MaterialParameter::Color(args.specular_color.truncate().extend(1.0)),
        );
        self.parameter(
            "MatEmissiveColor",
            MaterialParameter::Color(emissive_color(
                args.surface.emission_map.is_some(),
                args.surface.emission_color,
            )),
        );
        self.parameter("Metallic", MaterialParameter::Float(mr.metallic));
        self.parameter("Roughness", MaterialParameter::Float(mr.roughness));
    }

    fn legacy(&mut self, args: &LegacyShaderArguments, settings: &ExportSettings) {
        self.texture(TextureUnit::Diffuse, args.diffuse_map.as_ref(), settings);
        self.texture(TextureUnit::Normal, args.bump_map.as_ref(), settings);
        self.texture(TextureUnit::Emissive, args.emission_map.as_ref(), settings);

        self.parameter("MatDiffColor", MaterialParameter::Color(args.diffuse_color));
        // the engine keeps the specular power in the alpha channel
        self.parameter(
            "MatSpecColor",
            MaterialParameter::Color(
                args.specular_color
                    .truncate()
                    .extend(args.shininess * 128.0),
            ),
        );
        self.parameter(
            "MatEmissiveColor",
            MaterialParameter::Color(emissive_color(
                args.emission_map.is_some(),
                args.emission_color,
            )),
        );
    }

    fn skybox(&mut self, args: &SkyboxShaderArguments, settings: &ExportSettings) {
        if args.cubemap.is_none() && args.faces.iter().any(Option::is_some) {
            warn!("Six sided skyboxes need their faces assembled into a cubemap first");
        }

        self.texture(TextureUnit::Environment, args.cubemap.as_ref(), settings);

        let tint = args.tint.truncate() * args.exposure * 2.0;
        self.parameter("MatDiffColor", MaterialParameter::Color(tint.extend(1.0)));
    }

    /// Looks up a parameter by name.
    pub fn parameter_value(&self, name: &str) -> Option<&MaterialParameter> {
        self.parameters
            .iter()
            .find(|(parameter, _)| parameter == name)
            .map(|(_, value)| value)
    }
}

/// A material only glows through its emission map, the constant alone doesn't count.
fn emissive_color(has_map: bool, color: Vec4) -> Vec4 {
    if has_map {
        color
    } else {
        Vec3::ZERO.extend(1.0)
    }
}

fn format_parameter(value: &MaterialParameter) -> String {
    match value {
        MaterialParameter::Color(color) => write_float_list(&color.to_array()),
        MaterialParameter::Float(value) => write_float_list(&[*value]),
    }
}

impl WritableFile for MaterialFile {
    fn write_to_buffer(&self) -> Result<ByteBuffer> {
        let xml = MaterialXml {
            technique: TechniqueXml {
                name: Cow::Borrowed(&self.technique),
            },
            textures: self
                .textures
                .iter()
                .map(|texture| TextureXml {
                    unit: Cow::Borrowed(texture.unit.name()),
                    name: Cow::Borrowed(&texture.name),
                })
                .collect(),
            parameters: self
                .parameters
                .iter()
                .map(|(name, value)| ParameterXml {
                    name: Cow::Borrowed(name),
                    value: Cow::Owned(format_parameter(value)),
                })
                .collect(),
        };

        let document = xml
            .to_string()
            .map_err(|err| Error::Xml(format!("{err:?}")))?;

        Ok(document.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{PropertyBag, RenderMode, SemanticTable};

    fn write(material: &MaterialFile) -> String {
        String::from_utf8(material.write_to_buffer().unwrap()).unwrap()
    }

    #[test]
    fn test_diffuse_normal() {
        let args = ShaderArguments::MetallicGlossiness(MetallicGlossinessShaderArguments {
            base_map: Some("Assets/Rock.png".to_string()),
            surface: crate::shader::SurfaceArguments {
                bump_map: Some("Assets/Rock_normal.png".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });

        let material = MaterialFile::from_arguments(&args, &ExportSettings::default());
        assert_eq!(
            material.flags,
            TechniqueFlags::DIFFUSE | TechniqueFlags::NORMAL
        );
        assert_eq!(material.technique, "Techniques/DiffNormal.xml");

        let xml = write(&material);
        assert!(xml.starts_with("<material>"));
        assert!(xml.contains(r#"<technique name="Techniques/DiffNormal.xml"/>"#));
        assert!(xml.contains(r#"<texture unit="diffuse" name="Textures/Rock.dds"/>"#));
        assert!(xml.contains(r#"<texture unit="normal" name="Textures/Rock_normal.dds"/>"#));
        assert!(xml.contains(r#"<parameter name="MatDiffColor" value="1 1 1 1"/>"#));
        assert!(xml.contains(r#"<parameter name="Metallic" value="0"/>"#));
        assert!(xml.ends_with("</material>"));
    }

    #[test]
    fn test_from_property_bag() {
        let table = SemanticTable::builtin().unwrap();

        let mut bag = PropertyBag::new();
        bag.set_texture("_MainTex", "Leaves.tga")
            .set_float("_Mode", 2.0);

        let args = table.arguments("Standard", &bag).unwrap();
        let material = MaterialFile::from_arguments(&args, &ExportSettings::default());

        assert_eq!(material.technique, "Techniques/DiffAlpha.xml");
    }

    #[test]
    fn test_diffuse_color_alpha() {
        let args = ShaderArguments::MetallicGlossiness(MetallicGlossinessShaderArguments {
            base_color: Vec4::new(1.0, 1.0, 1.0, 0.5),
            ..Default::default()
        });

        assert_eq!(technique_flags(&args), TechniqueFlags::ALPHA);
    }

    #[test]
    fn test_opaque_render_mode() {
        let mut args = MetallicGlossinessShaderArguments::default();
        args.surface.render_mode = RenderMode::Cutout;

        assert!(!technique_flags(&ShaderArguments::MetallicGlossiness(args))
            .contains(TechniqueFlags::ALPHA));
    }

    #[test]
    fn test_specular_workflow() {
        // a pure dielectric specular converts back to a non-metal
        let args = ShaderArguments::SpecularGlossiness(SpecularGlossinessShaderArguments {
            diffuse_map: Some("Wood.png".to_string()),
            diffuse_color: Vec4::new(0.5, 0.25, 0.1, 1.0),
            specular_color: Vec4::new(0.04, 0.04, 0.04, 1.0),
            smoothness: 0.75,
            ..Default::default()
        });

        let material = MaterialFile::from_arguments(&args, &ExportSettings::default());
        assert_eq!(material.technique, "Techniques/Diff.xml");

        let Some(MaterialParameter::Float(metallic)) = material.parameter_value("Metallic") else {
            panic!("missing metallic");
        };
        let Some(MaterialParameter::Float(roughness)) = material.parameter_value("Roughness")
        else {
            panic!("missing roughness");
        };
        assert!(metallic.abs() < 0.01);
        assert!((roughness - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_legacy_specular_power() {
        let args = ShaderArguments::Legacy(LegacyShaderArguments {
            diffuse_map: Some("Crate.png".to_string()),
            shininess: 0.5,
            ..Default::default()
        });

        let material = MaterialFile::from_arguments(&args, &ExportSettings::default());
        assert_eq!(material.technique, "Techniques/Diff.xml");
        assert_eq!(
            material.parameter_value("MatSpecColor"),
            Some(&MaterialParameter::Color(Vec4::new(0.5, 0.5, 0.5, 64.0)))
        );
    }

    #[test]
    fn test_skybox() {
        let args = ShaderArguments::Skybox(SkyboxShaderArguments {
            cubemap: Some("Sky/Sunset.hdr".to_string()),
            ..Default::default()
        });

        let settings = ExportSettings {
            technique_prefix: String::new(),
            ..Default::default()
        };
        let material = MaterialFile::from_arguments(&args, &settings);

        assert_eq!(material.technique, SKYBOX_TECHNIQUE);
        assert_eq!(
            material.textures,
            vec![MaterialTexture {
                unit: TextureUnit::Environment,
                name: "Textures/Sunset.dds".to_string(),
            }]
        );
        assert!(write(&material).contains(r#"<texture unit="environment""#));
    }
}
