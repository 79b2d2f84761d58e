// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use binrw::{BinResult, BinWriterExt};
use glam::{Vec2, Vec3, Vec4};

use crate::model::Model;

// Maximum value of byte, used to multiply floats in that space [0.0..1.0] to [0..255]
const MAX_BYTE_FLOAT: f32 = u8::MAX as f32;

impl Model {
    pub(crate) fn write_single2<T: BinWriterExt>(cursor: &mut T, vec: &Vec2) -> BinResult<()> {
        cursor.write_le::<[f32; 2]>(&vec.to_array())
    }

    pub(crate) fn write_single3<T: BinWriterExt>(cursor: &mut T, vec: &Vec3) -> BinResult<()> {
        cursor.write_le::<[f32; 3]>(&vec.to_array())
    }

    pub(crate) fn write_single4<T: BinWriterExt>(cursor: &mut T, vec: &Vec4) -> BinResult<()> {
        cursor.write_le::<[f32; 4]>(&vec.to_array())
    }

    pub(crate) fn write_ubyte4<T: BinWriterExt>(cursor: &mut T, vec: &[u8; 4]) -> BinResult<()> {
        cursor.write_le::<[u8; 4]>(vec)
    }

    pub(crate) fn write_ubyte4_norm<T: BinWriterExt>(cursor: &mut T, vec: &Vec4) -> BinResult<()> {
        let clamped = vec.clamp(Vec4::ZERO, Vec4::ONE);
        cursor.write_le::<[u8; 4]>(&[
            (clamped.x * MAX_BYTE_FLOAT).round() as u8,
            (clamped.y * MAX_BYTE_FLOAT).round() as u8,
            (clamped.z * MAX_BYTE_FLOAT).round() as u8,
            (clamped.w * MAX_BYTE_FLOAT).round() as u8,
        ])
    }

    /// The engine's bitangent sign is the opposite of the source's.
    pub(crate) fn write_tangent<T: BinWriterExt>(cursor: &mut T, vec: &Vec4) -> BinResult<()> {
        cursor.write_le::<[f32; 4]>(&[vec.x, vec.y, vec.z, -vec.w])
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binrw::BinReaderExt;
    use glam::{Vec2, Vec3, Vec4};

    use crate::model::Model;

    #[test]
    fn single2() {
        let mut v = vec![];
        Model::write_single2(&mut Cursor::new(&mut v), &Vec2::new(0.5, -1.0)).unwrap();

        let mut read_cursor = Cursor::new(v.as_slice());
        assert_eq!(read_cursor.read_le::<[f32; 2]>().unwrap(), [0.5, -1.0]);
    }

    #[test]
    fn single3() {
        let a = Vec3::new(3.0, 0.0, -1.0);

        let mut v = vec![];
        Model::write_single3(&mut Cursor::new(&mut v), &a).unwrap();

        let mut read_cursor = Cursor::new(v.as_slice());
        assert_eq!(read_cursor.read_le::<[f32; 3]>().unwrap(), a.to_array());
    }

    #[test]
    fn single4() {
        let a = Vec4::new(3.0, 0.0, -1.0, 12.0);

        let mut v = vec![];
        Model::write_single4(&mut Cursor::new(&mut v), &a).unwrap();

        let mut read_cursor = Cursor::new(v.as_slice());
        assert_eq!(read_cursor.read_le::<[f32; 4]>().unwrap(), a.to_array());
    }

    #[test]
    fn ubyte4() {
        let a = [5u8, 0u8, 3u8, 15u8];

        let mut v = vec![];
        Model::write_ubyte4(&mut Cursor::new(&mut v), &a).unwrap();

        assert_eq!(v, a.to_vec());
    }

    #[test]
    fn ubyte4_norm() {
        let mut v = vec![];
        Model::write_ubyte4_norm(&mut Cursor::new(&mut v), &Vec4::new(0.0, 1.0, 0.5, 2.0))
            .unwrap();

        assert_eq!(v, vec![0, 255, 128, 255]);
    }

    #[test]
    fn tangent() {
        let mut v = vec![];
        Model::write_tangent(&mut Cursor::new(&mut v), &Vec4::new(1.0, 0.5, -0.5, 1.0)).unwrap();

        let mut read_cursor = Cursor::new(v.as_slice());
        assert_eq!(
            read_cursor.read_le::<[f32; 4]>().unwrap(),
            [1.0, 0.5, -0.5, -1.0]
        );
    }
}
