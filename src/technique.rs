// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::borrow::Cow;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::Result;

/// Bumped whenever an entry of [`DEFAULT_TECHNIQUES`] changes. Technique names are a contract with the engine's asset pack.
pub const TECHNIQUE_TABLE_VERSION: u32 = 1;

bitflags! {
    /// Which inputs a material provides.
    #[derive(Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TechniqueFlags : u8 {
        const DIFFUSE = 0x01;
        const SPECULAR = 0x02;
        const NORMAL = 0x04;
        const EMISSIVE = 0x08;
        const ALPHA = 0x10;
    }
}

impl TechniqueFlags {
    /// Whether a technique needing `self` can render a material providing `actual`.
    ///
    /// Every input the technique samples has to exist, and the alpha flag has to match exactly since it changes the blend mode.
    pub fn fits(self, actual: TechniqueFlags) -> bool {
        actual.contains(self)
            && self.contains(TechniqueFlags::ALPHA) == actual.contains(TechniqueFlags::ALPHA)
    }

    /// Number of flags that differ.
    pub fn distance(self, other: TechniqueFlags) -> u32 {
        (self.bits() ^ other.bits()).count_ones()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub flags: TechniqueFlags,
    pub name: Cow<'static, str>,
}

const fn technique(bits: u8, name: &'static str) -> Technique {
    Technique {
        flags: TechniqueFlags { bits },
        name: Cow::Borrowed(name),
    }
}

const D: u8 = TechniqueFlags::DIFFUSE.bits;
const S: u8 = TechniqueFlags::SPECULAR.bits;
const N: u8 = TechniqueFlags::NORMAL.bits;
const E: u8 = TechniqueFlags::EMISSIVE.bits;
const A: u8 = TechniqueFlags::ALPHA.bits;

pub static DEFAULT_TECHNIQUES: [Technique; 16] = [
    technique(0, "NoTexture.xml"),
    technique(A, "NoTextureAlpha.xml"),
    technique(D, "Diff.xml"),
    technique(D | A, "DiffAlpha.xml"),
    technique(D | S, "DiffSpec.xml"),
    technique(D | S | A, "DiffSpecAlpha.xml"),
    technique(D | N, "DiffNormal.xml"),
    technique(D | N | A, "DiffNormalAlpha.xml"),
    technique(D | E, "DiffEmissive.xml"),
    technique(D | E | A, "DiffEmissiveAlpha.xml"),
    technique(D | S | N, "DiffNormalSpec.xml"),
    technique(D | S | N | A, "DiffNormalSpecAlpha.xml"),
    technique(D | N | E, "DiffNormalEmissive.xml"),
    technique(D | N | E | A, "DiffNormalEmissiveAlpha.xml"),
    technique(D | S | N | E, "DiffNormalSpecEmissive.xml"),
    technique(D | S | N | E | A, "DiffNormalSpecEmissiveAlpha.xml"),
];

/// An ordered list of techniques. Earlier entries win ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueTable {
    pub version: u32,
    pub techniques: Vec<Technique>,
}

impl Default for TechniqueTable {
    fn default() -> Self {
        Self {
            version: TECHNIQUE_TABLE_VERSION,
            techniques: DEFAULT_TECHNIQUES.to_vec(),
        }
    }
}

impl TechniqueTable {
    /// Parses a table from a JSON document.
    pub fn from_json(json: &str) -> Result<TechniqueTable> {
        Ok(serde_json::from_str(json)?)
    }

    /// The closest technique that can render a material with `flags`, if any fits.
    pub fn select(&self, flags: TechniqueFlags) -> Option<&Technique> {
        let selected = nearest(&self.techniques, flags);

        if let Some(technique) = selected {
            trace!(?flags, name = %technique.name, "Selected technique");
        }

        selected
    }
}

fn nearest(techniques: &[Technique], flags: TechniqueFlags) -> Option<&Technique> {
    // min_by_key keeps the first of equally close candidates
    techniques
        .iter()
        .filter(|technique| technique.flags.fits(flags))
        .min_by_key(|technique| technique.flags.distance(flags))
}

/// Name of the closest default technique for `flags`.
pub fn select_technique(flags: TechniqueFlags) -> &'static str {
    // NoTexture and NoTextureAlpha fit anything
    nearest(&DEFAULT_TECHNIQUES, flags)
        .map(|technique| technique.name.as_ref())
        .unwrap_or("NoTexture.xml")
}
