use crate::editor::transform::TransformState;
use crate::scene_graph::ObjectId;

/// A reversible edit. Objects are referenced by id; the scene keeps removed
/// objects allocated so the ids stay valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryAction {
    Add {
        object: ObjectId,
    },
    Delete {
        object: ObjectId,
    },
    Transform {
        object: ObjectId,
        old: TransformState,
        new: TransformState,
    },
}

impl HistoryAction {
    pub fn object(&self) -> ObjectId {
        match *self {
            HistoryAction::Add { object }
            | HistoryAction::Delete { object }
            | HistoryAction::Transform { object, .. } => object,
        }
    }
}

/// Linear undo/redo stacks. Recording a new action drops everything that
/// could have been redone.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<HistoryAction>,
    redo: Vec<HistoryAction>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: HistoryAction) {
        self.undo.push(action);
        self.redo.clear();
    }

    /// Pops the latest action and moves it to the redo stack. The caller
    /// applies the inverse.
    pub fn undo(&mut self) -> Option<HistoryAction> {
        let action = self.undo.pop()?;
        self.redo.push(action);
        Some(action)
    }

    /// Pops the latest undone action and moves it back to the undo stack. The
    /// caller re-applies it.
    pub fn redo(&mut self) -> Option<HistoryAction> {
        let action = self.redo.pop()?;
        self.undo.push(action);
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene_graph::{Object3D, Scene};

    fn ids(count: usize) -> Vec<ObjectId> {
        let mut scene = Scene::new();
        (0..count)
            .map(|i| scene.add_object(Object3D::new(format!("Object {i}"))))
            .collect()
    }

    #[test]
    fn undo_and_redo_move_actions_between_stacks() {
        let ids = ids(2);
        let mut history = History::new();
        history.record(HistoryAction::Add { object: ids[0] });
        history.record(HistoryAction::Delete { object: ids[1] });

        assert_eq!(history.undo(), Some(HistoryAction::Delete { object: ids[1] }));
        assert_eq!(history.undo(), Some(HistoryAction::Add { object: ids[0] }));
        assert_eq!(history.undo(), None);
        assert!(!history.can_undo());

        assert_eq!(history.redo(), Some(HistoryAction::Add { object: ids[0] }));
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 1);
    }

    #[test]
    fn recording_clears_redo() {
        let ids = ids(2);
        let mut history = History::new();
        history.record(HistoryAction::Add { object: ids[0] });
        history.undo();
        assert!(history.can_redo());

        let state = TransformState {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        };
        history.record(HistoryAction::Transform {
            object: ids[1],
            old: state,
            new: state,
        });

        assert!(!history.can_redo());
        assert_eq!(history.redo(), None);
        assert_eq!(history.undo().map(|action| action.object()), Some(ids[1]));
    }
}
