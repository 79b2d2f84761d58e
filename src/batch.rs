// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::dds::DdsTexture;
use crate::model::Model;
use crate::{ByteBuffer, Result, WritableFile};

/// Serializes every file, keeping the results in input order.
///
/// Files are independent of each other, a failure only affects its own slot.
pub fn write_all<F: WritableFile + Sync>(files: &[F]) -> Vec<Result<ByteBuffer>> {
    debug!(count = files.len(), "Writing files");

    #[cfg(feature = "parallel")]
    let results = files
        .par_iter()
        .map(WritableFile::write_to_buffer)
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results = files.iter().map(WritableFile::write_to_buffer).collect();

    results
}

/// Encodes every texture as a DDS file.
pub fn write_textures(textures: &[DdsTexture]) -> Vec<Result<ByteBuffer>> {
    write_all(textures)
}

/// Encodes every model as an UMD2 file.
pub fn write_models(models: &[Model]) -> Vec<Result<ByteBuffer>> {
    write_all(models)
}
