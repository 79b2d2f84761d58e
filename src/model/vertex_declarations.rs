// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(clippy::identity_op)]

use binrw::{BinResult, BinWriterExt};
use modular_bitfield::prelude::*;

use crate::model::Mesh;

/// Number of UV channels a mesh can carry.
pub const MAX_UV_CHANNELS: usize = 4;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexType {
    Int = 0,
    Float = 1,
    Vector2 = 2,
    Vector3 = 3,
    Vector4 = 4,
    UByte4 = 5,
    UByte4Norm = 6,
}

impl VertexType {
    /// Size of one element of this type in bytes.
    pub fn size(self) -> usize {
        match self {
            VertexType::Int | VertexType::Float => 4,
            VertexType::Vector2 => 8,
            VertexType::Vector3 => 12,
            VertexType::Vector4 => 16,
            VertexType::UByte4 | VertexType::UByte4Norm => 4,
        }
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexSemantic {
    Position = 0,
    Normal = 1,
    Binormal = 2,
    Tangent = 3,
    TexCoord = 4,
    Color = 5,
    BlendWeights = 6,
    BlendIndices = 7,
}

/// How an element is described on disk: type in the low byte, semantic in the next, usage index in the high half.
#[bitfield]
#[derive(Clone, Copy, Debug)]
pub struct VertexElementTag {
    pub vertex_type: B8,
    pub semantic: B8,
    pub index: B16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexElement {
    pub vertex_type: VertexType,
    pub semantic: VertexSemantic,
    pub index: u16,
}

impl VertexElement {
    const fn new(vertex_type: VertexType, semantic: VertexSemantic, index: u16) -> Self {
        Self {
            vertex_type,
            semantic,
            index,
        }
    }

    pub fn tag(&self) -> VertexElementTag {
        VertexElementTag::new()
            .with_vertex_type(self.vertex_type as u8)
            .with_semantic(self.semantic as u8)
            .with_index(self.index)
    }

    /// The tag as a single little endian word.
    pub fn packed(&self) -> u32 {
        u32::from_le_bytes(self.tag().into_bytes())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexDeclaration {
    pub elements: Vec<VertexElement>,
}

impl VertexDeclaration {
    /// Declares one element for each non-empty stream of `mesh`, in the order the engine expects them.
    pub fn for_mesh(mesh: &Mesh) -> Self {
        let mut elements = Vec::new();

        if !mesh.positions.is_empty() {
            elements.push(VertexElement::new(
                VertexType::Vector3,
                VertexSemantic::Position,
                0,
            ));
        }

        if !mesh.normals.is_empty() {
            elements.push(VertexElement::new(
                VertexType::Vector3,
                VertexSemantic::Normal,
                0,
            ));
        }

        // weights and indices always come as a pair
        if !mesh.bone_weights.is_empty() {
            elements.push(VertexElement::new(
                VertexType::Vector4,
                VertexSemantic::BlendWeights,
                0,
            ));
            elements.push(VertexElement::new(
                VertexType::UByte4,
                VertexSemantic::BlendIndices,
                0,
            ));
        }

        if !mesh.colors.is_empty() {
            elements.push(VertexElement::new(
                VertexType::UByte4Norm,
                VertexSemantic::Color,
                0,
            ));
        }

        if !mesh.tangents.is_empty() {
            elements.push(VertexElement::new(
                VertexType::Vector4,
                VertexSemantic::Tangent,
                0,
            ));
        }

        for (channel, uv) in mesh.uvs.iter().enumerate() {
            if !uv.is_empty() {
                elements.push(VertexElement::new(
                    VertexType::Vector2,
                    VertexSemantic::TexCoord,
                    channel as u16,
                ));
            }
        }

        Self { elements }
    }

    /// Size of one interleaved vertex in bytes.
    pub fn stride(&self) -> usize {
        self.elements.iter().map(|e| e.vertex_type.size()).sum()
    }

    /// Writes the element count, the element tags and an empty morphable mask.
    pub(crate) fn write<T: BinWriterExt>(&self, writer: &mut T) -> BinResult<()> {
        writer.write_le(&(self.elements.len() as u32))?;

        for element in &self.elements {
            writer.write_le(&element.packed())?;
        }

        // no morph targets
        writer.write_le(&0u32)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use glam::{Vec2, Vec3, Vec4};

    use super::*;
    use crate::model::BoneInfluence;

    #[test]
    fn test_tag_packing() {
        let element = VertexElement::new(VertexType::Vector2, VertexSemantic::TexCoord, 3);

        assert_eq!(element.packed(), 2 | (4 << 8) | (3 << 16));
    }

    #[test]
    fn test_position_only() {
        let mesh = Mesh {
            positions: vec![Vec3::ZERO; 3],
            ..Default::default()
        };

        let declaration = VertexDeclaration::for_mesh(&mesh);
        assert_eq!(declaration.elements.len(), 1);
        assert_eq!(declaration.stride(), 12);
    }

    #[test]
    fn test_stream_order() {
        let mesh = Mesh {
            positions: vec![Vec3::ZERO],
            normals: vec![Vec3::Y],
            colors: vec![Vec4::ONE],
            tangents: vec![Vec4::X],
            bone_weights: vec![BoneInfluence::default()],
            uvs: [vec![Vec2::ZERO], vec![], vec![Vec2::ONE], vec![]],
        };

        let semantics: Vec<(VertexSemantic, u16)> = VertexDeclaration::for_mesh(&mesh)
            .elements
            .iter()
            .map(|e| (e.semantic, e.index))
            .collect();

        assert_eq!(
            semantics,
            vec![
                (VertexSemantic::Position, 0),
                (VertexSemantic::Normal, 0),
                (VertexSemantic::BlendWeights, 0),
                (VertexSemantic::BlendIndices, 0),
                (VertexSemantic::Color, 0),
                (VertexSemantic::Tangent, 0),
                (VertexSemantic::TexCoord, 0),
                (VertexSemantic::TexCoord, 2),
            ]
        );
    }

    #[test]
    fn test_write() {
        let mesh = Mesh {
            positions: vec![Vec3::ZERO],
            normals: vec![Vec3::Y],
            ..Default::default()
        };

        let mut v = vec![];
        VertexDeclaration::for_mesh(&mesh)
            .write(&mut Cursor::new(&mut v))
            .unwrap();

        let mut expected = vec![];
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&3u32.to_le_bytes());
        expected.extend_from_slice(&(3u32 | (1 << 8)).to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(v, expected);
    }
}
