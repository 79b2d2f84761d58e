// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(clippy::unnecessary_fallible_conversions)] // This wrongly trips on binrw code

use std::io::{Cursor, Write};

use binrw::{binrw, BinWrite};
use bitflags::bitflags;
use texpresso::{Format, Params};
use tracing::{debug, warn};

use crate::config::ExportSettings;
use crate::pbr::linear_to_srgb_rgba8;
use crate::{ByteBuffer, Error, Result, WritableFile};

const HEADER_SIZE: u32 = 124;
const PIXEL_FORMAT_SIZE: u32 = 32;

const FOURCC_DXT1: u32 = 0x31545844;
const FOURCC_DXT5: u32 = 0x35545844;

bitflags! {
    pub struct DdsFlags : u32 {
        const CAPS = 0x1;
        const HEIGHT = 0x2;
        const WIDTH = 0x4;
        const PITCH = 0x8;
        const PIXEL_FORMAT = 0x1000;
        const MIPMAP_COUNT = 0x20000;
        const LINEAR_SIZE = 0x80000;
        const DEPTH = 0x800000;
    }
}

bitflags! {
    pub struct DdsPixelFlags : u32 {
        const ALPHA_PIXELS = 0x1;
        const ALPHA = 0x2;
        const FOURCC = 0x4;
        const RGB = 0x40;
    }
}

bitflags! {
    pub struct DdsCaps : u32 {
        const COMPLEX = 0x8;
        const TEXTURE = 0x1000;
        const MIPMAP = 0x400000;
    }
}

bitflags! {
    pub struct DdsCaps2 : u32 {
        const CUBEMAP = 0x200;
        const CUBEMAP_POSITIVE_X = 0x400;
        const CUBEMAP_NEGATIVE_X = 0x800;
        const CUBEMAP_POSITIVE_Y = 0x1000;
        const CUBEMAP_NEGATIVE_Y = 0x2000;
        const CUBEMAP_POSITIVE_Z = 0x4000;
        const CUBEMAP_NEGATIVE_Z = 0x8000;
        const CUBEMAP_ALL_FACES = Self::CUBEMAP.bits
            | Self::CUBEMAP_POSITIVE_X.bits
            | Self::CUBEMAP_NEGATIVE_X.bits
            | Self::CUBEMAP_POSITIVE_Y.bits
            | Self::CUBEMAP_NEGATIVE_Y.bits
            | Self::CUBEMAP_POSITIVE_Z.bits
            | Self::CUBEMAP_NEGATIVE_Z.bits;
    }
}

/// The 32 byte DDS_PIXELFORMAT block.
#[binrw]
#[derive(Debug, Clone, PartialEq)]
#[brw(little)]
pub struct DdsPixelFormat {
    pub size: u32,
    #[br(map = DdsPixelFlags::from_bits_truncate)]
    #[bw(map = |x: &DdsPixelFlags| x.bits())]
    pub flags: DdsPixelFlags,
    pub fourcc: u32,
    pub rgb_bit_count: u32,
    pub r_bit_mask: u32,
    pub g_bit_mask: u32,
    pub b_bit_mask: u32,
    pub a_bit_mask: u32,
}

impl DdsPixelFormat {
    fn rgba8() -> Self {
        Self {
            size: PIXEL_FORMAT_SIZE,
            flags: DdsPixelFlags::RGB | DdsPixelFlags::ALPHA_PIXELS,
            fourcc: 0,
            rgb_bit_count: 32,
            r_bit_mask: 0x000000FF,
            g_bit_mask: 0x0000FF00,
            b_bit_mask: 0x00FF0000,
            a_bit_mask: 0xFF000000,
        }
    }

    fn fourcc(fourcc: u32) -> Self {
        Self {
            size: PIXEL_FORMAT_SIZE,
            flags: DdsPixelFlags::FOURCC,
            fourcc,
            rgb_bit_count: 0,
            r_bit_mask: 0,
            g_bit_mask: 0,
            b_bit_mask: 0,
            a_bit_mask: 0,
        }
    }
}

/// The "DDS " magic followed by the 124 byte DDS_HEADER.
#[binrw]
#[derive(Debug, Clone, PartialEq)]
#[brw(little, magic = 0x20534444u32)]
pub struct DdsHeader {
    pub size: u32,
    #[br(map = DdsFlags::from_bits_truncate)]
    #[bw(map = |x: &DdsFlags| x.bits())]
    pub flags: DdsFlags,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mipmap_count: u32,
    pub reserved1: [u32; 11],
    pub pixel_format: DdsPixelFormat,
    #[br(map = DdsCaps::from_bits_truncate)]
    #[bw(map = |x: &DdsCaps| x.bits())]
    pub caps: DdsCaps,
    #[br(map = DdsCaps2::from_bits_truncate)]
    #[bw(map = |x: &DdsCaps2| x.bits())]
    pub caps2: DdsCaps2,
    pub caps3: u32,
    pub caps4: u32,
    pub reserved2: u32,
}

impl DdsHeader {
    fn surface_caps(mip_count: u32, cubemap: bool) -> (DdsCaps, DdsCaps2) {
        if cubemap {
            (
                DdsCaps::TEXTURE | DdsCaps::MIPMAP | DdsCaps::COMPLEX,
                DdsCaps2::CUBEMAP_ALL_FACES,
            )
        } else if mip_count > 1 {
            (
                DdsCaps::TEXTURE | DdsCaps::MIPMAP | DdsCaps::COMPLEX,
                DdsCaps2::empty(),
            )
        } else {
            (DdsCaps::TEXTURE, DdsCaps2::empty())
        }
    }

    /// Header for raw RGBA8 pixel data.
    pub fn uncompressed(width: u32, height: u32, mip_count: u32, cubemap: bool) -> Self {
        let (caps, caps2) = Self::surface_caps(mip_count, cubemap);

        Self {
            size: HEADER_SIZE,
            flags: DdsFlags::CAPS
                | DdsFlags::HEIGHT
                | DdsFlags::WIDTH
                | DdsFlags::PIXEL_FORMAT
                | DdsFlags::MIPMAP_COUNT
                | DdsFlags::PITCH,
            height,
            width,
            pitch_or_linear_size: width * 4,
            depth: 0,
            mipmap_count: mip_count,
            reserved1: [0; 11],
            pixel_format: DdsPixelFormat::rgba8(),
            caps,
            caps2,
            caps3: 0,
            caps4: 0,
            reserved2: 0,
        }
    }

    /// Header for DXT5 (when `has_alpha`) or DXT1 block compressed data.
    pub fn compressed(
        width: u32,
        height: u32,
        mip_count: u32,
        has_alpha: bool,
        cubemap: bool,
    ) -> Self {
        let (caps, caps2) = Self::surface_caps(mip_count, cubemap);
        let format = block_format(has_alpha);

        Self {
            size: HEADER_SIZE,
            flags: DdsFlags::CAPS
                | DdsFlags::HEIGHT
                | DdsFlags::WIDTH
                | DdsFlags::PIXEL_FORMAT
                | DdsFlags::MIPMAP_COUNT
                | DdsFlags::LINEAR_SIZE,
            height,
            width,
            pitch_or_linear_size: format.compressed_size(width as usize, height as usize) as u32,
            depth: 0,
            mipmap_count: mip_count,
            reserved1: [0; 11],
            pixel_format: DdsPixelFormat::fourcc(if has_alpha {
                FOURCC_DXT5
            } else {
                FOURCC_DXT1
            }),
            caps,
            caps2,
            caps3: 0,
            caps4: 0,
            reserved2: 0,
        }
    }
}

fn block_format(has_alpha: bool) -> Format {
    if has_alpha {
        Format::Bc3
    } else {
        Format::Bc1
    }
}

/// Layout of the source pixel data handed to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
    Rgb8,
    R8,
    RgbaHalf,
    RgbaFloat,
}

/// One image with its mip chain. Mip `n` is `max(1, width >> n)` by `max(1, height >> n)` pixels.
#[derive(Debug, Clone)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub mips: Vec<ByteBuffer>,
}

impl Surface {
    /// A surface with a single RGBA8 mip level.
    pub fn rgba8(width: u32, height: u32, pixels: ByteBuffer) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            mips: vec![pixels],
        }
    }

    fn mip_size(&self, level: usize) -> (u32, u32) {
        (
            (self.width >> level).max(1),
            (self.height >> level).max(1),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.format != PixelFormat::Rgba8 {
            return Err(Error::UnsupportedFormat(self.format));
        }

        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid(format!(
                "surface has zero size ({}x{})",
                self.width, self.height
            )));
        }

        if self.mips.is_empty() {
            return Err(Error::invalid("surface has no mip levels"));
        }

        // halving stops at 1x1
        let max_levels = (32 - self.width.max(self.height).leading_zeros()) as usize;
        if self.mips.len() > max_levels {
            return Err(Error::invalid(format!(
                "{}x{} surface has {} mip levels, at most {max_levels} are possible",
                self.width,
                self.height,
                self.mips.len()
            )));
        }

        for (level, mip) in self.mips.iter().enumerate() {
            let (width, height) = self.mip_size(level);
            let expected = width as usize * height as usize * 4;
            if mip.len() != expected {
                return Err(Error::invalid(format!(
                    "mip {level} is {} bytes, expected {expected} for {width}x{height} RGBA8",
                    mip.len()
                )));
            }
        }

        Ok(())
    }
}

/// Cubemap faces, in the order they are stored in the file.
pub const CUBEMAP_FACE_ORDER: [CubemapFace; 6] = [
    CubemapFace::PositiveX,
    CubemapFace::NegativeX,
    CubemapFace::PositiveY,
    CubemapFace::NegativeY,
    CubemapFace::PositiveZ,
    CubemapFace::NegativeZ,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubemapFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

#[derive(Debug, Clone)]
pub enum TextureKind {
    Texture2D(Surface),
    /// Faces indexed like [`CUBEMAP_FACE_ORDER`].
    Cubemap(Box<[Surface; 6]>),
}

/// How the pixel data is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsOptions {
    /// Use DXT block compression when the dimensions are multiples of 4.
    pub compress: bool,
    /// Encode cubemap faces from linear to sRGB.
    pub srgb: bool,
}

impl From<&ExportSettings> for DdsOptions {
    fn from(settings: &ExportSettings) -> Self {
        Self {
            compress: settings.compress_textures,
            srgb: settings.cubemap_srgb,
        }
    }
}

/// A texture ready to be written as a DDS file.
#[derive(Debug, Clone)]
pub struct DdsTexture {
    pub kind: TextureKind,
    /// Picks DXT5 over DXT1 when compressing.
    pub has_alpha: bool,
    pub options: DdsOptions,
}

impl DdsTexture {
    pub fn new_2d(surface: Surface, has_alpha: bool, settings: &ExportSettings) -> Self {
        Self {
            kind: TextureKind::Texture2D(surface),
            has_alpha,
            options: settings.into(),
        }
    }

    pub fn new_cubemap(faces: [Surface; 6], has_alpha: bool, settings: &ExportSettings) -> Self {
        Self {
            kind: TextureKind::Cubemap(Box::new(faces)),
            has_alpha,
            options: settings.into(),
        }
    }

    fn base_surface(&self) -> &Surface {
        match &self.kind {
            TextureKind::Texture2D(surface) => surface,
            TextureKind::Cubemap(faces) => &faces[0],
        }
    }

    fn validate(&self) -> Result<()> {
        match &self.kind {
            TextureKind::Texture2D(surface) => surface.validate(),
            TextureKind::Cubemap(faces) => {
                let first = &faces[0];
                if first.width != first.height {
                    return Err(Error::invalid(format!(
                        "cubemap faces must be square, got {}x{}",
                        first.width, first.height
                    )));
                }

                for (face, surface) in CUBEMAP_FACE_ORDER.iter().zip(faces.iter()) {
                    surface.validate()?;

                    if surface.width != first.width
                        || surface.height != first.height
                        || surface.mips.len() != first.mips.len()
                    {
                        return Err(Error::invalid(format!(
                            "cubemap face {face:?} doesn't match the size and mip count of the first face"
                        )));
                    }
                }

                Ok(())
            }
        }
    }

    /// Whether the payload will be block compressed.
    pub fn is_compressed(&self) -> bool {
        let base = self.base_surface();
        self.options.compress && base.width % 4 == 0 && base.height % 4 == 0
    }

    /// Builds the header that [`WritableFile::write_to_buffer`] emits.
    pub fn header(&self) -> DdsHeader {
        let base = self.base_surface();
        let cubemap = matches!(self.kind, TextureKind::Cubemap(_));
        let mip_count = base.mips.len() as u32;

        if self.is_compressed() {
            DdsHeader::compressed(base.width, base.height, mip_count, self.has_alpha, cubemap)
        } else {
            DdsHeader::uncompressed(base.width, base.height, mip_count, cubemap)
        }
    }

    fn write_mip<T: Write>(
        &self,
        writer: &mut T,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<()> {
        if self.is_compressed() {
            let format = block_format(self.has_alpha);
            let mut blocks = vec![0u8; format.compressed_size(width as usize, height as usize)];
            format.compress(
                pixels,
                width as usize,
                height as usize,
                Params::default(),
                &mut blocks,
            );
            writer.write_all(&blocks).map_err(binrw::Error::Io)?;
        } else {
            writer.write_all(pixels).map_err(binrw::Error::Io)?;
        }

        Ok(())
    }
}

/// Reverses the row order of RGBA8 pixel data.
fn flip_vertically(pixels: &[u8], width: u32) -> ByteBuffer {
    let stride = width as usize * 4;
    pixels
        .chunks_exact(stride)
        .rev()
        .flatten()
        .copied()
        .collect()
}

fn encode_srgb(pixels: &[u8]) -> ByteBuffer {
    pixels
        .chunks_exact(4)
        .flat_map(|p| linear_to_srgb_rgba8([p[0], p[1], p[2], p[3]]))
        .collect()
}

impl WritableFile for DdsTexture {
    fn write_to_buffer(&self) -> Result<ByteBuffer> {
        self.validate()?;

        let header = self.header();
        let base = self.base_surface();
        if self.options.compress && !self.is_compressed() {
            warn!(
                width = base.width,
                height = base.height,
                "Texture dimensions are not multiples of 4, writing uncompressed"
            );
        }

        debug!(
            width = base.width,
            height = base.height,
            mips = base.mips.len(),
            compressed = self.is_compressed(),
            "Writing DDS texture"
        );

        let mut buffer = ByteBuffer::new();

        {
            let mut cursor = Cursor::new(&mut buffer);

            header.write(&mut cursor)?;

            match &self.kind {
                TextureKind::Texture2D(surface) => {
                    for (level, mip) in surface.mips.iter().enumerate() {
                        let (width, height) = surface.mip_size(level);

                        // The engine expects the top level upside down compared to the source, the rest of the chain as is
                        if level == 0 {
                            let flipped = flip_vertically(mip, width);
                            self.write_mip(&mut cursor, &flipped, width, height)?;
                        } else {
                            self.write_mip(&mut cursor, mip, width, height)?;
                        }
                    }
                }
                TextureKind::Cubemap(faces) => {
                    for surface in faces.iter() {
                        for (level, mip) in surface.mips.iter().enumerate() {
                            let (width, height) = surface.mip_size(level);

                            if self.options.srgb {
                                let encoded = encode_srgb(mip);
                                self.write_mip(&mut cursor, &encoded, width, height)?;
                            } else {
                                self.write_mip(&mut cursor, mip, width, height)?;
                            }
                        }
                    }
                }
            }
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use binrw::BinRead;

    use super::*;

    fn checkerboard(width: u32, height: u32) -> ByteBuffer {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        pixels
    }

    fn settings(compress: bool) -> ExportSettings {
        ExportSettings {
            compress_textures: compress,
            ..Default::default()
        }
    }

    #[test]
    fn test_header_size() {
        let mut buffer = ByteBuffer::new();
        DdsHeader::uncompressed(4, 4, 1, false)
            .write(&mut Cursor::new(&mut buffer))
            .unwrap();

        assert_eq!(buffer.len(), 128);
    }

    #[test]
    fn test_compressed_header_bytes() {
        let mut buffer = ByteBuffer::new();
        DdsHeader::compressed(256, 256, 1, true, false)
            .write(&mut Cursor::new(&mut buffer))
            .unwrap();

        let mut expected = [0u8; 128];
        expected[0..4].copy_from_slice(b"DDS ");
        expected[4..8].copy_from_slice(&124u32.to_le_bytes());
        expected[8..12].copy_from_slice(&0x000A1007u32.to_le_bytes());
        expected[12..16].copy_from_slice(&256u32.to_le_bytes());
        expected[16..20].copy_from_slice(&256u32.to_le_bytes());
        // 64x64 blocks of 16 bytes
        expected[20..24].copy_from_slice(&65536u32.to_le_bytes());
        expected[28..32].copy_from_slice(&1u32.to_le_bytes());
        expected[76..80].copy_from_slice(&32u32.to_le_bytes());
        expected[80..84].copy_from_slice(&4u32.to_le_bytes());
        expected[84..88].copy_from_slice(b"DXT5");
        expected[108..112].copy_from_slice(&0x1000u32.to_le_bytes());

        assert_eq!(buffer, expected.to_vec());
    }

    #[test]
    fn test_uncompressed_header() {
        let header = DdsHeader::uncompressed(64, 32, 1, false);

        assert_eq!(header.flags.bits(), 0x00001007 | 0x00020000 | 0x00000008);
        assert_eq!(header.pitch_or_linear_size, 256);
        assert_eq!(header.pixel_format.flags.bits(), 0x41);
        assert_eq!(header.pixel_format.rgb_bit_count, 32);
        assert_eq!(header.pixel_format.a_bit_mask, 0xFF000000);
    }

    #[test]
    fn test_dxt1_fourcc() {
        let header = DdsHeader::compressed(8, 8, 1, false, false);

        assert_eq!(header.pixel_format.fourcc, 0x31545844);
        // 2x2 blocks of 8 bytes
        assert_eq!(header.pitch_or_linear_size, 32);
    }

    #[test]
    fn test_cubemap_caps() {
        let header = DdsHeader::uncompressed(16, 16, 1, true);

        assert_eq!(header.caps.bits(), 0x00001000 | 0x00400008 | 0x00000008);
        assert_eq!(
            header.caps2.bits(),
            0x00000600 | 0x00000a00 | 0x00001200 | 0x00002200 | 0x00004200 | 0x00008200
        );
    }

    #[test]
    fn test_header_read_back() {
        let header = DdsHeader::compressed(128, 64, 8, false, false);

        let mut buffer = ByteBuffer::new();
        header.write(&mut Cursor::new(&mut buffer)).unwrap();

        let read = DdsHeader::read(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(read, header);
    }

    #[test]
    fn test_compressed_payload_size() {
        let texture = DdsTexture::new_2d(
            Surface::rgba8(16, 16, checkerboard(16, 16)),
            true,
            &settings(true),
        );

        let buffer = texture.write_to_buffer().unwrap();
        assert_eq!(buffer.len(), 128 + 16 * 16);
    }

    #[test]
    fn test_odd_size_falls_back_to_raw() {
        let texture = DdsTexture::new_2d(
            Surface::rgba8(6, 3, checkerboard(6, 3)),
            false,
            &settings(true),
        );

        assert!(!texture.is_compressed());

        let buffer = texture.write_to_buffer().unwrap();
        assert_eq!(buffer.len(), 128 + 6 * 3 * 4);
        assert_eq!(&buffer[84..88], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_top_mip_is_flipped() {
        // bottom row red, top row blue
        let mut pixels = vec![];
        pixels.extend_from_slice(&[255, 0, 0, 255, 255, 0, 0, 255]);
        pixels.extend_from_slice(&[0, 0, 255, 255, 0, 0, 255, 255]);

        let surface = Surface {
            width: 2,
            height: 2,
            format: PixelFormat::Rgba8,
            mips: vec![pixels.clone(), vec![1, 2, 3, 4]],
        };
        let texture = DdsTexture::new_2d(surface, false, &settings(false));
        let buffer = texture.write_to_buffer().unwrap();

        assert_eq!(&buffer[128..136], &pixels[8..16]);
        assert_eq!(&buffer[136..144], &pixels[0..8]);
        // the second mip is left alone
        assert_eq!(&buffer[144..148], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_cubemap_faces_not_flipped() {
        let faces: [Surface; 6] = std::array::from_fn(|i| {
            let mut pixels = vec![i as u8; 4 * 4];
            pixels[0] = 200;
            Surface::rgba8(2, 2, pixels)
        });

        let texture = DdsTexture::new_cubemap(faces, false, &settings(false));
        let buffer = texture.write_to_buffer().unwrap();

        assert_eq!(buffer.len(), 128 + 6 * 16);
        for face in 0..6 {
            let start = 128 + face * 16;
            assert_eq!(buffer[start], 200);
            assert_eq!(buffer[start + 1], face as u8);
        }
    }

    #[test]
    fn test_cubemap_srgb() {
        let faces: [Surface; 6] =
            std::array::from_fn(|_| Surface::rgba8(1, 1, vec![128, 128, 128, 128]));

        let mut settings = settings(false);
        settings.cubemap_srgb = true;

        let buffer = DdsTexture::new_cubemap(faces, true, &settings)
            .write_to_buffer()
            .unwrap();

        assert_eq!(&buffer[128..132], &linear_to_srgb_rgba8([128, 128, 128, 128]));
        assert_eq!(buffer[131], 128);
    }

    #[test]
    fn test_unsupported_format() {
        let surface = Surface {
            width: 4,
            height: 4,
            format: PixelFormat::RgbaFloat,
            mips: vec![vec![0; 4 * 4 * 16]],
        };

        let result = DdsTexture::new_2d(surface, false, &settings(true)).write_to_buffer();
        assert!(matches!(
            result,
            Err(Error::UnsupportedFormat(PixelFormat::RgbaFloat))
        ));
    }

    #[test]
    fn test_wrong_mip_size() {
        let surface = Surface {
            width: 4,
            height: 4,
            format: PixelFormat::Rgba8,
            mips: vec![checkerboard(4, 4), checkerboard(4, 4)],
        };

        let result = DdsTexture::new_2d(surface, false, &settings(true)).write_to_buffer();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_too_many_mips() {
        // a 4x4 chain ends after 4x4, 2x2 and 1x1
        let surface = Surface {
            width: 4,
            height: 4,
            format: PixelFormat::Rgba8,
            mips: vec![
                checkerboard(4, 4),
                checkerboard(2, 2),
                checkerboard(1, 1),
                checkerboard(1, 1),
            ],
        };

        let result = DdsTexture::new_2d(surface, false, &settings(false)).write_to_buffer();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let surface = Surface {
            width: 1,
            height: 1,
            format: PixelFormat::Rgba8,
            mips: vec![checkerboard(1, 1); 40],
        };

        let result = DdsTexture::new_2d(surface, false, &settings(false)).write_to_buffer();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_full_mip_chain() {
        let surface = Surface {
            width: 4,
            height: 2,
            format: PixelFormat::Rgba8,
            mips: vec![checkerboard(4, 2), checkerboard(2, 1), checkerboard(1, 1)],
        };

        let buffer = DdsTexture::new_2d(surface, false, &settings(false))
            .write_to_buffer()
            .unwrap();
        assert_eq!(buffer.len(), 128 + (8 + 2 + 1) * 4);
    }

    #[test]
    fn test_compressed_cubemap_mip_chain() {
        let faces: [Surface; 6] = std::array::from_fn(|_| Surface {
            width: 8,
            height: 8,
            format: PixelFormat::Rgba8,
            mips: vec![
                checkerboard(8, 8),
                checkerboard(4, 4),
                checkerboard(2, 2),
                checkerboard(1, 1),
            ],
        });

        let texture = DdsTexture::new_cubemap(faces, true, &settings(true));
        assert!(texture.is_compressed());

        let buffer = texture.write_to_buffer().unwrap();

        let header = DdsHeader::read(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(header.mipmap_count, 4);
        assert_eq!(header.caps2, DdsCaps2::CUBEMAP_ALL_FACES);
        assert_eq!(&header.pixel_format.fourcc.to_le_bytes(), b"DXT5");

        // DXT5 blocks are 16 bytes, 2x2 and 1x1 mips still take a whole block
        assert_eq!(buffer.len(), 128 + 6 * (4 * 16 + 16 + 16 + 16));
    }

    #[test]
    fn test_cubemap_face_mismatch() {
        let mut faces: [Surface; 6] =
            std::array::from_fn(|_| Surface::rgba8(4, 4, checkerboard(4, 4)));
        faces[3] = Surface::rgba8(2, 2, checkerboard(2, 2));

        let result = DdsTexture::new_cubemap(faces, false, &settings(true)).write_to_buffer();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_compressed_roundtrip_is_close() {
        let pixels = vec![200u8, 100, 50, 255].repeat(16);
        let texture = DdsTexture::new_2d(Surface::rgba8(4, 4, pixels), false, &settings(true));
        let buffer = texture.write_to_buffer().unwrap();

        let mut decoded = vec![0u8; 4 * 4 * 4];
        Format::Bc1.decompress(&buffer[128..], 4, 4, &mut decoded);

        for pixel in decoded.chunks_exact(4) {
            assert!((pixel[0] as i32 - 200).abs() <= 8);
            assert!((pixel[1] as i32 - 100).abs() <= 8);
            assert!((pixel[2] as i32 - 50).abs() <= 8);
        }
    }
}
