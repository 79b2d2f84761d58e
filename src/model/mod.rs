// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(clippy::unnecessary_fallible_conversions)] // This wrongly trips on binrw code

mod file_operations;

pub mod vertex_declarations;

use std::io::Cursor;

use binrw::{binrw, BinWrite, BinWriterExt};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use tracing::debug;

use crate::common_file_operations::write_string;
use crate::config::ExportSettings;
use crate::{ByteBuffer, Error, Result, WritableFile};
use vertex_declarations::{VertexDeclaration, VertexSemantic, MAX_UV_CHANNELS};

/// Models with at least this many vertices need 32-bit indices.
pub const MAX_SHORT_INDEX_VERTICES: usize = 65536;

/// Blend indices are stored as bytes.
pub const MAX_SKINNING_BONES: usize = 256;

const MODEL_VERSION: u32 = 1;

/// Triangle list, the only topology the exporter emits.
const PRIMITIVE_TRIANGLE_LIST: u32 = 0;

// Bounding sphere and bounding box present
const BONE_COLLISION_SPHERE: u8 = 0x1;
const BONE_COLLISION_BOX: u8 = 0x2;

// Used for bones that no vertex is skinned to
const EMPTY_BONE_EXTENT: f32 = 0.1;

#[binrw]
#[derive(Debug, Clone, PartialEq)]
#[brw(little, magic = 0x32444D55u32)]
pub struct ModelFileHeader {
    pub version: u32,
}

#[binrw]
#[derive(Debug, Clone, Copy, PartialEq)]
#[brw(little)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    fn from_points(points: impl Iterator<Item = Vec3>) -> Option<BoundingBox> {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut any = false;

        for point in points {
            min = min.min(point);
            max = max.max(point);
            any = true;
        }

        any.then(|| BoundingBox {
            min: min.to_array(),
            max: max.to_array(),
        })
    }
}

#[binrw]
#[derive(Debug, Clone, PartialEq)]
#[brw(little)]
struct GeometryRecord {
    bone_mapping_count: u32,
    lod_count: u32,
    lod_distance: f32,
    primitive_type: u32,
    vertex_buffer: u32,
    index_buffer: u32,
    index_start: u32,
    index_count: u32,
}

/// Everything in a bone entry after its name.
#[binrw]
#[derive(Debug, Clone, PartialEq)]
#[brw(little)]
pub struct BoneRecord {
    pub parent_index: u32,
    pub position: [f32; 3],
    /// W first
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Row major 3x4, the projective row is dropped
    pub offset_matrix: [f32; 12],
    pub collision_mask: u8,
    pub radius: f32,
    pub bounds: BoundingBox,
}

/// Up to four bones affecting a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoneInfluence {
    pub indices: [u32; 4],
    pub weights: [f32; 4],
}

/// Per-vertex streams. Every stream is either empty or as long as `positions`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Linear RGBA in [0..1]
    pub colors: Vec<Vec4>,
    pub tangents: Vec<Vec4>,
    pub bone_weights: Vec<BoneInfluence>,
    pub uvs: [Vec<Vec2>; MAX_UV_CHANNELS],
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// A range of the shared vertex buffer drawn with one material.
#[derive(Debug, Clone, Default)]
pub struct SubMesh {
    pub name: String,
    /// Triangle list indices into the mesh's vertices
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// Index of the parent bone in the model's `bones`, `None` for roots
    pub parent: Option<usize>,

    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    /// Transforms model space into the bone's space
    pub inverse_bind: Mat4,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            inverse_bind: Mat4::IDENTITY,
        }
    }
}

/// Model file, written with the `.mdl` file extension.
///
/// Contains one vertex buffer, one index buffer shared by every submesh, and an optional skeleton.
#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: Mesh,
    pub submeshes: Vec<SubMesh>,
    pub bones: Vec<Bone>,

    /// Minimum weight for a vertex to count towards a bone's bounds.
    pub bone_weight_threshold: f32,
}

impl Model {
    pub fn new(mesh: Mesh, submeshes: Vec<SubMesh>, bones: Vec<Bone>) -> Self {
        Self::with_settings(mesh, submeshes, bones, &ExportSettings::default())
    }

    pub fn with_settings(
        mesh: Mesh,
        submeshes: Vec<SubMesh>,
        bones: Vec<Bone>,
        settings: &ExportSettings,
    ) -> Self {
        Self {
            mesh,
            submeshes,
            bones,
            bone_weight_threshold: settings.bone_weight_threshold,
        }
    }

    /// Width of each index in bytes, 2 or 4.
    pub fn index_size(&self) -> u32 {
        index_size_for(self.mesh.vertex_count())
    }

    pub fn index_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.indices.len()).sum()
    }

    /// Box around every vertex position, `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.mesh.positions.iter().copied())
    }

    /// Bounding sphere radius and box of the vertices skinned to `bone_index`, in that bone's space. `None` if there is no such bone.
    pub fn bone_bounds(&self, bone_index: usize) -> Option<(f32, BoundingBox)> {
        let bone = self.bones.get(bone_index)?;
        Some(self.skinned_bounds(bone_index, bone.inverse_bind))
    }

    fn skinned_bounds(&self, bone_index: usize, inverse_bind: Mat4) -> (f32, BoundingBox) {
        let skinned = self
            .mesh
            .bone_weights
            .iter()
            .zip(self.mesh.positions.iter())
            .filter(|(influence, _)| {
                influence
                    .indices
                    .iter()
                    .zip(influence.weights.iter())
                    .any(|(&index, &weight)| {
                        index as usize == bone_index && weight >= self.bone_weight_threshold
                    })
            })
            .map(|(_, position)| inverse_bind.transform_point3(*position));

        let mut radius: f32 = 0.0;
        let bounds = BoundingBox::from_points(skinned.inspect(|p| radius = radius.max(p.length())));

        match bounds {
            Some(bounds) => (radius, bounds),
            None => (
                EMPTY_BONE_EXTENT,
                BoundingBox {
                    min: [-EMPTY_BONE_EXTENT; 3],
                    max: [EMPTY_BONE_EXTENT; 3],
                },
            ),
        }
    }

    fn validate(&self) -> Result<()> {
        let vertex_count = self.mesh.vertex_count();
        if vertex_count == 0 {
            return Err(Error::invalid("mesh has no vertices"));
        }

        let check_stream = |name: &str, len: usize| -> Result<()> {
            if len != 0 && len != vertex_count {
                return Err(Error::invalid(format!(
                    "{name} stream has {len} entries but the mesh has {vertex_count} vertices"
                )));
            }
            Ok(())
        };

        check_stream("normal", self.mesh.normals.len())?;
        check_stream("color", self.mesh.colors.len())?;
        check_stream("tangent", self.mesh.tangents.len())?;
        check_stream("bone weight", self.mesh.bone_weights.len())?;
        for (channel, uv) in self.mesh.uvs.iter().enumerate() {
            check_stream(&format!("uv{channel}"), uv.len())?;
        }

        for submesh in &self.submeshes {
            if submesh.indices.len() % 3 != 0 {
                return Err(Error::invalid(format!(
                    "submesh {:?} has {} indices, which isn't a triangle list",
                    submesh.name,
                    submesh.indices.len()
                )));
            }

            if let Some(index) = submesh
                .indices
                .iter()
                .find(|&&index| index as usize >= vertex_count)
            {
                return Err(Error::invalid(format!(
                    "submesh {:?} references vertex {index} but the mesh has {vertex_count} vertices",
                    submesh.name
                )));
            }
        }

        for influence in &self.mesh.bone_weights {
            for &index in &influence.indices {
                let index = index as usize;
                if index >= self.bones.len() || index >= MAX_SKINNING_BONES {
                    return Err(Error::invalid(format!(
                        "vertex is skinned to bone {index} but the model has {} bones",
                        self.bones.len()
                    )));
                }
            }
        }

        self.validate_skeleton()
    }

    fn validate_skeleton(&self) -> Result<()> {
        for (i, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= self.bones.len() {
                    return Err(Error::invalid(format!(
                        "bone {:?} has parent {parent} but there are {} bones",
                        bone.name,
                        self.bones.len()
                    )));
                }
            }

            // parents can come before or after their children, so walk up until a root shows up
            let mut current = bone.parent;
            let mut steps = 0;
            while let Some(parent) = current {
                if parent == i || steps > self.bones.len() {
                    return Err(Error::invalid(format!(
                        "bone {:?} is part of a parent cycle",
                        bone.name
                    )));
                }
                current = self.bones[parent].parent;
                steps += 1;
            }
        }

        Ok(())
    }

    fn write_vertices<T: BinWriterExt>(
        &self,
        cursor: &mut T,
        declaration: &VertexDeclaration,
    ) -> Result<()> {
        let mesh = &self.mesh;

        for k in 0..mesh.vertex_count() {
            for element in &declaration.elements {
                match element.semantic {
                    VertexSemantic::Position => {
                        Model::write_single3(cursor, &mesh.positions[k])?;
                    }
                    VertexSemantic::Normal => {
                        Model::write_single3(cursor, &mesh.normals[k])?;
                    }
                    VertexSemantic::BlendWeights => {
                        Model::write_single4(
                            cursor,
                            &Vec4::from_array(mesh.bone_weights[k].weights),
                        )?;
                    }
                    VertexSemantic::BlendIndices => {
                        // validated to fit in a byte
                        let indices = mesh.bone_weights[k].indices.map(|i| i as u8);
                        Model::write_ubyte4(cursor, &indices)?;
                    }
                    VertexSemantic::Color => {
                        Model::write_ubyte4_norm(cursor, &mesh.colors[k])?;
                    }
                    VertexSemantic::Tangent => {
                        Model::write_tangent(cursor, &mesh.tangents[k])?;
                    }
                    VertexSemantic::TexCoord => {
                        Model::write_single2(cursor, &mesh.uvs[element.index as usize][k])?;
                    }
                    VertexSemantic::Binormal => {
                        return Err(Error::invalid("binormal streams are not supported"));
                    }
                }
            }
        }

        Ok(())
    }

    fn bone_record(&self, index: usize, bone: &Bone) -> BoneRecord {
        let (radius, bounds) = self.skinned_bounds(index, bone.inverse_bind);

        let m = bone.inverse_bind;
        let mut offset_matrix = [0.0; 12];
        for row in 0..3 {
            let r = m.row(row);
            offset_matrix[row * 4..row * 4 + 4].copy_from_slice(&r.to_array());
        }

        BoneRecord {
            // roots point at themselves
            parent_index: bone.parent.unwrap_or(index) as u32,
            position: bone.position.to_array(),
            rotation: [
                bone.rotation.w,
                bone.rotation.x,
                bone.rotation.y,
                bone.rotation.z,
            ],
            scale: bone.scale.to_array(),
            offset_matrix,
            collision_mask: BONE_COLLISION_SPHERE | BONE_COLLISION_BOX,
            radius,
            bounds,
        }
    }
}

/// Width of each index in bytes for a vertex buffer of `vertex_count` vertices.
pub fn index_size_for(vertex_count: usize) -> u32 {
    if vertex_count < MAX_SHORT_INDEX_VERTICES {
        2
    } else {
        4
    }
}

impl WritableFile for Model {
    fn write_to_buffer(&self) -> Result<ByteBuffer> {
        self.validate()?;

        let declaration = VertexDeclaration::for_mesh(&self.mesh);
        let vertex_count = self.mesh.vertex_count();
        let index_size = self.index_size();

        debug!(
            vertex_count,
            index_size,
            submeshes = self.submeshes.len(),
            bones = self.bones.len(),
            "Writing model"
        );

        let mut buffer = ByteBuffer::new();

        {
            let mut cursor = Cursor::new(&mut buffer);

            ModelFileHeader {
                version: MODEL_VERSION,
            }
            .write(&mut cursor)?;

            // vertex buffers
            cursor.write_le(&1u32)?;
            cursor.write_le(&(vertex_count as u32))?;
            declaration.write(&mut cursor)?;
            self.write_vertices(&mut cursor, &declaration)?;

            // index buffers, every submesh shares the same one
            cursor.write_le(&1u32)?;
            cursor.write_le(&(self.index_count() as u32))?;
            cursor.write_le(&index_size)?;
            for submesh in &self.submeshes {
                if index_size == 2 {
                    let indices: Vec<u16> = submesh.indices.iter().map(|&i| i as u16).collect();
                    cursor.write_le(&indices)?;
                } else {
                    cursor.write_le(&submesh.indices)?;
                }
            }

            // geometries
            cursor.write_le(&(self.submeshes.len() as u32))?;
            let mut index_start = 0;
            for submesh in &self.submeshes {
                GeometryRecord {
                    bone_mapping_count: 0,
                    lod_count: 1,
                    lod_distance: 0.0,
                    primitive_type: PRIMITIVE_TRIANGLE_LIST,
                    vertex_buffer: 0,
                    index_buffer: 0,
                    index_start,
                    index_count: submesh.indices.len() as u32,
                }
                .write(&mut cursor)?;

                index_start += submesh.indices.len() as u32;
            }

            // morphs
            cursor.write_le(&0u32)?;

            cursor.write_le(&(self.bones.len() as u32))?;
            for (i, bone) in self.bones.iter().enumerate() {
                cursor.write_le(&write_string(&bone.name)?)?;
                self.bone_record(i, bone).write(&mut cursor)?;
            }

            // validated to be non-empty
            if let Some(bounding_box) = self.bounding_box() {
                bounding_box.write(&mut cursor)?;
            }
        }

        Ok(buffer)
    }
}
