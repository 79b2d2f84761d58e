// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use glam::Vec3;

/// Specular reflectance of a typical dielectric (4%).
pub const DIELECTRIC_SPECULAR: Vec3 = Vec3::new(0.04, 0.04, 0.04);

const EPSILON: f32 = 1e-6;

// Coefficients of the linear to sRGB polynomial
const SRGB_K1: f32 = 0.662002687;
const SRGB_K2: f32 = 0.684122060;
const SRGB_K3: f32 = 0.323583601;
const SRGB_K4: f32 = 0.0225411470;

/// Material parameters in the metallic-roughness workflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetallicRoughness {
    pub base_color: Vec3,
    pub opacity: f32,
    pub metallic: f32,
    pub roughness: f32,
}

/// Material parameters in the specular-glossiness workflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecularGlossiness {
    pub diffuse: Vec3,
    pub opacity: f32,
    pub specular: Vec3,
    pub glossiness: f32,
}

/// Written so `t == 0.0` and `t == 1.0` return the endpoints bit for bit.
fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

fn clamp01(c: Vec3) -> Vec3 {
    c.clamp(Vec3::ZERO, Vec3::ONE)
}

/// Brightness of `c` as perceived by the human eye.
pub fn perceived_brightness(c: Vec3) -> f32 {
    (0.299 * c.x * c.x + 0.587 * c.y * c.y + 0.114 * c.z * c.z).sqrt()
}

fn solve_metallic(diffuse: f32, specular: f32, one_minus_specular_strength: f32) -> f32 {
    let a = DIELECTRIC_SPECULAR.x;
    if specular < a {
        return 0.0;
    }

    let b = diffuse * one_minus_specular_strength / (1.0 - a) + specular - 2.0 * a;
    let c = a - specular;
    let d = b * b - 4.0 * a * c;

    ((-b + d.sqrt()) / (2.0 * a)).clamp(0.0, 1.0)
}

/// Converts metallic-roughness parameters to specular-glossiness.
pub fn convert_to_specular_glossiness(mr: &MetallicRoughness) -> SpecularGlossiness {
    let base_color = clamp01(mr.base_color);
    let metallic = mr.metallic.clamp(0.0, 1.0);

    let specular = lerp(DIELECTRIC_SPECULAR, base_color, metallic);
    let one_minus_specular_strength = 1.0 - specular.max_element();

    let diffuse = if one_minus_specular_strength < EPSILON {
        Vec3::ZERO
    } else {
        base_color * ((1.0 - DIELECTRIC_SPECULAR.x) * (1.0 - metallic) / one_minus_specular_strength)
    };

    SpecularGlossiness {
        diffuse: clamp01(diffuse),
        opacity: mr.opacity,
        specular: clamp01(specular),
        glossiness: (1.0 - mr.roughness).clamp(0.0, 1.0),
    }
}

/// Converts specular-glossiness parameters to metallic-roughness.
pub fn convert_to_metallic_roughness(sg: &SpecularGlossiness) -> MetallicRoughness {
    let diffuse = clamp01(sg.diffuse);
    let specular = clamp01(sg.specular);

    let one_minus_specular_strength = 1.0 - specular.max_element();
    let metallic = solve_metallic(
        perceived_brightness(diffuse),
        perceived_brightness(specular),
        one_minus_specular_strength,
    );

    let from_diffuse = diffuse
        * (one_minus_specular_strength
            / (1.0 - DIELECTRIC_SPECULAR.x)
            / (1.0 - metallic).max(EPSILON));
    let from_specular =
        (specular - DIELECTRIC_SPECULAR * (1.0 - metallic)) * (1.0 / metallic.max(EPSILON));

    MetallicRoughness {
        base_color: clamp01(lerp(from_diffuse, from_specular, metallic * metallic)),
        opacity: sg.opacity,
        metallic,
        roughness: (1.0 - sg.glossiness).clamp(0.0, 1.0),
    }
}

/// Approximates the linear to sRGB transfer function for a single channel.
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0 {
        return 0.0;
    }

    let s1 = c.sqrt();
    let s2 = s1.sqrt();
    let s3 = s2.sqrt();

    (SRGB_K1 * s1 + SRGB_K2 * s2 - SRGB_K3 * s3 - SRGB_K4 * c).clamp(0.0, 1.0)
}

/// Encodes the RGB channels of an RGBA8 pixel from linear to sRGB. Alpha is left alone.
pub fn linear_to_srgb_rgba8(pixel: [u8; 4]) -> [u8; 4] {
    let encode = |c: u8| (linear_to_srgb(f32::from(c) / 255.0) * 255.0).round() as u8;
    [encode(pixel[0]), encode(pixel[1]), encode(pixel[2]), pixel[3]]
}
