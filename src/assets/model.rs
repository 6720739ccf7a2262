use std::path::Path;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use gltf::buffer;

use crate::assets::error::LoadError;
use crate::math::bounds::{union_all, AABB};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Linear base color of the primitive's material.
    pub color: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshPrimitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Triangle geometry of one glTF mesh. Shared between every object spawned
/// from the same model.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    pub primitives: Vec<MeshPrimitive>,
}

/// A loaded model hierarchy, detached from any scene.
///
/// Node names, local transforms, triangle geometry and the bounds of each
/// node's mesh survive the import. Textures do not.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub mesh_bounds: Option<AABB>,
    pub geometry: Option<Arc<MeshGeometry>>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    pub fn group(name: impl Into<String>, children: Vec<ModelNode>) -> Self {
        Self {
            name: name.into(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh_bounds: None,
            geometry: None,
            children,
        }
    }

    pub fn mesh(name: impl Into<String>, bounds: AABB) -> Self {
        Self {
            mesh_bounds: Some(bounds),
            ..Self::group(name, Vec::new())
        }
    }

    #[cfg(test)]
    pub fn with_geometry(mut self, geometry: MeshGeometry) -> Self {
        self.geometry = Some(Arc::new(geometry));
        self
    }

    #[cfg(test)]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    #[cfg(test)]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Bounds of the whole hierarchy in the space this node is placed in.
    pub fn bounds(&self) -> Option<AABB> {
        self.bounds_in(Mat4::IDENTITY)
    }

    fn bounds_in(&self, parent: Mat4) -> Option<AABB> {
        let world = parent * self.local_matrix();
        let own = self.mesh_bounds.map(|bounds| bounds.transform(&world));
        let children = self.children.iter().filter_map(|child| child.bounds_in(world));

        union_all(own.into_iter().chain(children))
    }

    pub fn mesh_count(&self) -> usize {
        usize::from(self.mesh_bounds.is_some())
            + self.children.iter().map(ModelNode::mesh_count).sum::<usize>()
    }

    /// Parses a `.gltf` or `.glb` payload. Bounds come from the position
    /// accessors' min/max. External buffers are resolved against `base`;
    /// without one only embedded and GLB buffers can be read.
    pub fn from_gltf_slice(
        name: &str,
        bytes: &[u8],
        base: Option<&Path>,
    ) -> Result<ModelNode, LoadError> {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
        let buffers = gltf::import_buffers(&document, base, blob)?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| LoadError::EmptyModel(name.to_string()))?;

        let root = ModelNode::group(
            name,
            scene
                .nodes()
                .map(|node| from_gltf_node(&node, &buffers))
                .collect(),
        );

        if root.mesh_count() == 0 {
            return Err(LoadError::EmptyModel(name.to_string()));
        }

        Ok(root)
    }
}

fn from_gltf_node(node: &gltf::Node, buffers: &[buffer::Data]) -> ModelNode {
    let (translation, rotation, scale) = node.transform().decomposed();

    let mesh_bounds = node.mesh().and_then(|mesh| {
        union_all(mesh.primitives().map(|primitive| {
            let bounds = primitive.bounding_box();
            AABB::new(Vec3::from(bounds.min), Vec3::from(bounds.max))
        }))
    });

    let geometry = node
        .mesh()
        .and_then(|mesh| read_geometry(&mesh, buffers))
        .map(Arc::new);

    ModelNode {
        name: node.name().unwrap_or("Unnamed").to_string(),
        translation: translation.into(),
        rotation: Quat::from_array(rotation),
        scale: scale.into(),
        mesh_bounds,
        geometry,
        children: node
            .children()
            .map(|child| from_gltf_node(&child, buffers))
            .collect(),
    }
}

fn read_geometry(mesh: &gltf::Mesh, buffers: &[buffer::Data]) -> Option<MeshGeometry> {
    let primitives: Vec<MeshPrimitive> = mesh
        .primitives()
        .filter_map(|primitive| read_primitive(&primitive, buffers))
        .collect();

    (!primitives.is_empty()).then_some(MeshGeometry { primitives })
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[buffer::Data]) -> Option<MeshPrimitive> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::warn!("Skipping primitive with mode {:?}", primitive.mode());
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    if indices.len() < 3 || indices.iter().any(|&index| index as usize >= positions.len()) {
        log::warn!("Skipping primitive {} with invalid indices", primitive.index());
        return None;
    }

    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|normals| normals.map(Vec3::from).collect::<Vec<_>>())
        .filter(|normals| normals.len() == positions.len())
        .unwrap_or_else(|| compute_normals(&positions, &indices));

    let [r, g, b, _] = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();
    let color = Vec3::new(r, g, b);

    let vertices = positions
        .iter()
        .zip(&normals)
        .map(|(&position, &normal)| MeshVertex {
            position,
            normal,
            color,
        })
        .collect();

    Some(MeshPrimitive { vertices, indices })
}

/// Smooth vertex normals from the triangle faces, for meshes exported
/// without them.
pub fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let corners = [triangle[0], triangle[1], triangle[2]].map(|index| index as usize);
        let [Some(&a), Some(&b), Some(&c)] = corners.map(|index| positions.get(index)) else {
            continue;
        };

        let face = (b - a).cross(c - a);
        for index in corners {
            normals[index] += face;
        }
    }

    normals
        .into_iter()
        .map(|normal| normal.normalize_or(Vec3::Y))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One triangle spanning (0,0,0)..(4,2,3), held by a node translated by +1 on X.
    pub(crate) const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Body", "mesh": 0, "translation": [1.0, 0.0, 0.0] }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [4.0, 2.0, 3.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAQAAAAAAAAAAAAAAAAAAAAEAAAEBA"
        }]
    }"#;

    const NODES_WITHOUT_MESH_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Empty" }]
    }"#;

    #[test]
    fn parses_hierarchy_and_bounds() {
        let model = ModelNode::from_gltf_slice("Earth", TRIANGLE_GLTF.as_bytes(), None).unwrap();

        assert_eq!(model.name, "Earth");
        assert_eq!(model.children.len(), 1);
        assert_eq!(model.children[0].name, "Body");
        assert_eq!(model.mesh_count(), 1);

        let bounds = model.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(5.0, 2.0, 3.0));
    }

    #[test]
    fn reads_triangle_geometry() {
        let model = ModelNode::from_gltf_slice("Earth", TRIANGLE_GLTF.as_bytes(), None).unwrap();
        let geometry = model.children[0].geometry.as_ref().unwrap();

        assert_eq!(geometry.primitives.len(), 1);
        let primitive = &geometry.primitives[0];
        assert_eq!(primitive.indices, vec![0, 1, 2]);

        let positions: Vec<Vec3> = primitive.vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 3.0)]
        );

        // No NORMAL attribute in the file, so the face normal is used
        let expected = Vec3::new(0.0, -12.0, 8.0).normalize();
        assert!(primitive
            .vertices
            .iter()
            .all(|v| v.normal.distance(expected) < 1e-5));
        // Default material is white
        assert_eq!(primitive.vertices[0].color, Vec3::ONE);
    }

    #[test]
    fn external_buffers_need_a_base_path() {
        let external = TRIANGLE_GLTF.replace(
            "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAQAAAAAAAAAAAAAAAAAAAAEAAAEBA",
            "triangle.bin",
        );

        let result = ModelNode::from_gltf_slice("Earth", external.as_bytes(), None);
        assert!(matches!(result, Err(LoadError::Gltf(_))));
    }

    #[test]
    fn computed_normals_are_shared_between_faces() {
        // A flat quad on the XZ plane split into two faces, plus an unused vertex
        let positions = [
            Vec3::ZERO,
            Vec3::Z,
            Vec3::X,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::splat(9.0),
        ];
        let normals = compute_normals(&positions, &[0, 1, 2, 2, 1, 3]);

        assert_eq!(normals.len(), 5);
        for normal in &normals[..4] {
            assert!(normal.distance(Vec3::Y) < 1e-5, "{normal}");
        }
        assert_eq!(normals[4], Vec3::Y);
    }

    #[test]
    fn rejects_model_without_meshes() {
        let result = ModelNode::from_gltf_slice("Nothing", NODES_WITHOUT_MESH_GLTF.as_bytes(), None);
        assert!(matches!(result, Err(LoadError::EmptyModel(name)) if name == "Nothing"));
    }

    #[test]
    fn rejects_garbage() {
        let result = ModelNode::from_gltf_slice("Broken", b"not a model", None);
        assert!(matches!(result, Err(LoadError::Gltf(_))));
    }

    #[test]
    fn scaled_children_contribute_scaled_bounds() {
        let model = ModelNode::group(
            "Pair",
            vec![
                ModelNode::mesh("A", AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0)))
                    .with_scale(Vec3::splat(2.0)),
                ModelNode::mesh("B", AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0)))
                    .with_translation(Vec3::new(10.0, 0.0, 0.0)),
            ],
        );

        let bounds = model.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-2.0, -2.0, -2.0));
        assert_eq!(bounds.max, Vec3::new(11.0, 2.0, 2.0));
    }
}
