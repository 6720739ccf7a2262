use std::sync::Arc;

use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::assets::model::{MeshGeometry, ModelNode};
use crate::math::bounds::{union_all, AABB};
use crate::math::ray::Ray;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::transform::Transform;

/// Arena-backed scene graph.
///
/// Objects are never freed: removing an object only detaches it from the root
/// list, so ids held elsewhere (the undo history) stay valid and the object
/// can be re-attached later.
pub struct Scene {
    pub objects: Arena<Object3D>,
    roots: Vec<ObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            roots: Vec::new(),
        }
    }

    /// Allocates an object without attaching it to the scene.
    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    /// Adds a top-level object to the visible scene. Attaching twice is a no-op.
    pub fn attach(&mut self, id: ObjectId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
            self.invalidate_object_hierarchy(id);
        }
    }

    /// Removes a top-level object from the visible scene, keeping it allocated.
    pub fn detach(&mut self, id: ObjectId) -> bool {
        let before = self.roots.len();
        self.roots.retain(|&root| root != id);
        before != self.roots.len()
    }

    /// True when the object's top-level ancestor is in the scene.
    pub fn is_attached(&self, id: ObjectId) -> bool {
        self.roots.contains(&self.root_of(id))
    }

    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    pub fn root_of(&self, id: ObjectId) -> ObjectId {
        let mut current = id;
        while let Some(parent) = self.objects.get(current).and_then(|object| object.parent_id) {
            current = parent;
        }
        current
    }

    /// Every attached object, parents before children.
    pub fn attached_objects(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if let Some(object) = self.objects.get(id) {
                out.push(id);
                stack.extend(object.child_ids.iter().rev().copied());
            }
        }

        out
    }

    /// Instantiates a loaded model hierarchy under `parent`. Nothing becomes
    /// visible until the top-level ancestor is attached.
    pub fn spawn_model(&mut self, node: &ModelNode, parent: Option<ObjectId>) -> ObjectId {
        let object = Object3D {
            name: node.name.clone(),
            transform: Transform::new(node.translation, node.rotation, node.scale),
            mesh_bounds: node.mesh_bounds,
            geometry: node.geometry.clone(),
            ..Default::default()
        };

        let object_id = self.add_object(object);

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id));
        }

        for child in &node.children {
            self.spawn_model(child, Some(object_id));
        }

        object_id
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        for &root_id in &self.roots {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    /// Recursively updates an object's world transform and its children
    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                object.transform.set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_scale(&mut self, object_id: ObjectId, scale: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale(scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn rotate_object_y(&mut self, object_id: ObjectId, angle: f32) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.rotate_y(angle);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    /// World matrix computed from the current local transforms, independent
    /// of whether `late_update` has run since the last edit.
    pub fn world_matrix(&self, object_id: ObjectId) -> Mat4 {
        match self.objects.get(object_id) {
            Some(object) => {
                let local = *object.transform.get_local_matrix();
                match object.parent_id {
                    Some(parent_id) => self.world_matrix(parent_id) * local,
                    None => local,
                }
            }
            None => Mat4::IDENTITY,
        }
    }

    /// World-space box around every mesh in the object's subtree.
    pub fn world_bounds(&self, object_id: ObjectId) -> Option<AABB> {
        let mut boxes = Vec::new();
        self.collect_world_bounds(object_id, self.world_matrix(object_id), &mut boxes);
        union_all(boxes)
    }

    fn collect_world_bounds(&self, object_id: ObjectId, world: Mat4, out: &mut Vec<AABB>) {
        let Some(object) = self.objects.get(object_id) else {
            return;
        };

        if let Some(bounds) = object.mesh_bounds {
            out.push(bounds.transform(&world));
        }

        for &child_id in &object.child_ids {
            let child_world = world * *self.objects[child_id].transform.get_local_matrix();
            self.collect_world_bounds(child_id, child_world, out);
        }
    }

    /// Nearest attached mesh hit by `ray`, with its distance.
    pub fn raycast(&self, ray: &Ray) -> Option<(ObjectId, f32)> {
        self.attached_objects()
            .into_iter()
            .filter_map(|id| {
                let bounds = self.objects[id].mesh_bounds?;
                let distance = ray.intersect_transformed_aabb(&bounds, &self.world_matrix(id))?;
                Some((id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Attached objects that carry geometry, with the world matrices from the
    /// last `late_update`.
    pub fn visible_meshes(&self) -> Vec<(ObjectId, Arc<MeshGeometry>, Mat4)> {
        self.attached_objects()
            .into_iter()
            .filter_map(|id| {
                let object = &self.objects[id];
                let geometry = object.geometry.clone()?;
                Some((id, geometry, *object.transform.get_world_matrix()))
            })
            .collect()
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> AABB {
        AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    fn spawn_wrapped(scene: &mut Scene, name: &str, position: Vec3, scale: f32) -> ObjectId {
        let mut wrapper = Object3D::new(name);
        wrapper.transform.set_translation(position);
        wrapper.transform.set_scale(Vec3::splat(scale));
        let wrapper_id = scene.add_object(wrapper);
        let model = ModelNode::group(name, vec![ModelNode::mesh("Part", unit_box())]);
        scene.spawn_model(&model, Some(wrapper_id));
        scene.attach(wrapper_id);
        wrapper_id
    }

    #[test]
    fn attach_and_detach_keep_objects_allocated() {
        let mut scene = Scene::new();
        let id = spawn_wrapped(&mut scene, "Earth", Vec3::ZERO, 1.0);
        let part = scene.objects[id].child_ids[0];

        assert!(scene.is_attached(part));
        assert!(scene.detach(id));
        assert!(!scene.is_attached(part));
        assert!(!scene.detach(id));
        assert!(scene.get_object(id).is_some());

        scene.attach(id);
        scene.attach(id);
        assert_eq!(scene.roots(), &[id]);
    }

    #[test]
    fn world_bounds_include_parent_transform() {
        let mut scene = Scene::new();
        let id = spawn_wrapped(&mut scene, "Mars", Vec3::new(100.0, 0.0, 0.0), 10.0);

        let bounds = scene.world_bounds(id).unwrap();
        assert_eq!(bounds.min, Vec3::new(90.0, -10.0, -10.0));
        assert_eq!(bounds.max, Vec3::new(110.0, 10.0, 10.0));
    }

    #[test]
    fn raycast_returns_nearest_attached_part() {
        let mut scene = Scene::new();
        let near = spawn_wrapped(&mut scene, "Near", Vec3::new(0.0, 0.0, 10.0), 1.0);
        let far = spawn_wrapped(&mut scene, "Far", Vec3::new(0.0, 0.0, -10.0), 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 100.0), Vec3::NEG_Z);

        let (hit, _) = scene.raycast(&ray).unwrap();
        assert_eq!(scene.root_of(hit), near);

        scene.detach(near);
        let (hit, distance) = scene.raycast(&ray).unwrap();
        assert_eq!(scene.root_of(hit), far);
        assert!((distance - 109.0).abs() < 1e-3);
    }

    #[test]
    fn late_update_writes_world_matrices() {
        let mut scene = Scene::new();
        let id = spawn_wrapped(&mut scene, "Venus", Vec3::new(5.0, 0.0, 0.0), 2.0);
        scene.late_update();

        let part_id = scene.objects[id].child_ids[0];
        let world = *scene.objects[part_id].transform.get_world_matrix();
        assert_eq!(world, scene.world_matrix(part_id));
        assert_eq!(world.transform_point3(Vec3::X), Vec3::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn visible_meshes_follow_attachment() {
        let mut scene = Scene::new();
        let geometry = MeshGeometry {
            primitives: Vec::new(),
        };
        let model = ModelNode::group(
            "Saturn",
            vec![ModelNode::mesh("Body", unit_box()).with_geometry(geometry)],
        );
        let root = scene.spawn_model(&model, None);
        scene.set_object_translation(root, Vec3::new(0.0, 3.0, 0.0));
        assert!(scene.visible_meshes().is_empty());

        scene.attach(root);
        scene.late_update();
        let meshes = scene.visible_meshes();
        assert_eq!(meshes.len(), 1);

        let (id, _, world) = &meshes[0];
        assert_eq!(*id, scene.objects[root].child_ids[0]);
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn detached_objects_are_not_attached() {
        let mut scene = Scene::new();
        let id = spawn_wrapped(&mut scene, "Jupiter", Vec3::ZERO, 1.0);
        let part_id = scene.objects[id].child_ids[0];
        assert!(scene.attached_objects().contains(&part_id));

        scene.detach(id);
        assert!(!scene.is_attached(id));
        assert!(scene.attached_objects().is_empty());
    }
}
