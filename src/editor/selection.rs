use crate::math::bounds::AABB;
use crate::scene_graph::{ObjectId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutlineId(u64);

/// Wireframe box drawn around the selected object.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub id: OutlineId,
    pub bounds: Option<AABB>,
}

#[derive(Debug, Clone)]
struct Selected {
    object: ObjectId,
    outline: Outline,
}

/// At most one selected object. The outline exists exactly while something is
/// selected, and a new one is built for every selection change.
#[derive(Debug, Default)]
pub struct Selection {
    current: Option<Selected>,
    next_outline: u64,
}

impl Selection {
    pub fn selected(&self) -> Option<ObjectId> {
        self.current.as_ref().map(|selected| selected.object)
    }

    pub fn is_selected(&self, object: ObjectId) -> bool {
        self.selected() == Some(object)
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.current.as_ref().map(|selected| &selected.outline)
    }

    /// Returns false when `object` was already selected.
    pub fn select(&mut self, object: ObjectId, scene: &Scene) -> bool {
        if self.is_selected(object) {
            return false;
        }

        self.deselect();

        self.next_outline += 1;
        self.current = Some(Selected {
            object,
            outline: Outline {
                id: OutlineId(self.next_outline),
                bounds: scene.world_bounds(object),
            },
        });

        true
    }

    pub fn deselect(&mut self) -> Option<ObjectId> {
        self.current.take().map(|selected| selected.object)
    }

    /// Recomputes the outline after the selected object moved.
    pub fn refresh(&mut self, scene: &Scene) {
        if let Some(selected) = self.current.as_mut() {
            selected.outline.bounds = scene.world_bounds(selected.object);
        }
    }
}

/// Walks up from a picked part to the nearest selectable ancestor, so clicking
/// any piece of a composite model selects the whole model.
pub fn resolve_selectable(scene: &Scene, hit: ObjectId) -> Option<ObjectId> {
    let mut current = hit;

    loop {
        let object = scene.get_object(current)?;
        if object.is_selectable() {
            return Some(current);
        }
        current = object.parent_id?;
    }
}
