// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(clippy::upper_case_acronyms)]

/// Represents a continuous block of memory which is not owned, and comes either from an in-memory location or from a file.
pub type ByteSpan<'a> = &'a [u8];

/// Represents a continuous block of memory which is owned.
pub type ByteBuffer = Vec<u8>;

/// The error type shared by every writer.
pub mod error;

pub use error::{Error, Result};

/// Settings shared by the texture, model and material writers.
pub mod config;

/// Converting between metallic-roughness and specular-glossiness material parameters.
pub mod pbr;

/// Writing DirectDraw Surface (DDS) textures, raw or DXT compressed.
pub mod dds;

/// Writing binary models (UMD2).
pub mod model;

/// Picking the nearest pre-authored shader technique for a material.
pub mod technique;

/// Mapping shader properties to their semantic role.
pub mod shader;

/// Writing XML material descriptors.
#[cfg(feature = "material_export")]
pub mod mtrl;

/// Converting many assets at once.
pub mod batch;

mod common_file_operations;

/// Anything that can be serialized into one of the target engine's file formats.
pub trait WritableFile {
    /// Serializes this file into a new buffer.
    fn write_to_buffer(&self) -> Result<ByteBuffer>;
}
