use std::sync::Arc;

use glam::Vec3;
use id_arena::Id;

use crate::assets::model::MeshGeometry;
use crate::math::bounds::AABB;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// Editor state carried by objects the user placed.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorProps {
    pub selectable: bool,
    /// Half the largest horizontal extent after normalization, used by placement.
    pub radius: f32,
    pub spinning: bool,
    pub orbiting: bool,
    pub animation_speed: f32,
}

impl EditorProps {
    pub fn placed(radius: f32) -> Self {
        Self {
            selectable: true,
            radius,
            spinning: false,
            orbiting: false,
            animation_speed: 1.0,
        }
    }
}

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    /// Local-space bounds of the mesh attached to this node, if any.
    pub mesh_bounds: Option<AABB>,
    pub geometry: Option<Arc<MeshGeometry>>,
    pub editor: Option<EditorProps>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.editor.as_ref().is_some_and(|props| props.selectable)
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::from_translation(Vec3::ZERO),
            mesh_bounds: None,
            geometry: None,
            editor: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
