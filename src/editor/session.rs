use std::time::Instant;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assets::{LoadEvent, LoadOrigin, ModelNode};
use crate::camera::OrbitControls;
use crate::config::SandboxConfig;
use crate::editor::animation::{self, AnimationSettings};
use crate::editor::background::Color;
use crate::editor::command::EditorCommand;
use crate::editor::history::{History, HistoryAction};
use crate::editor::placement::{self, Occupant};
use crate::editor::selection::{resolve_selectable, Outline, Selection};
use crate::editor::transform::{
    AxisMode, Drag, KeyHoldController, MoveKey, PropertyEdit, TransformState,
};
use crate::math::ray::Ray;
use crate::scene_graph::{EditorProps, Object3D, ObjectId, Scene};

pub const INVALID_COLOR_ALERT: &str = "Invalid hex color code. Please use format: #RRGGBB";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub grid_visible: bool,
    pub starfield_visible: bool,
    pub panels_visible: bool,
    pub background: Color,
    pub star_color: Color,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            grid_visible: true,
            starfield_visible: true,
            panels_visible: true,
            background: Color::BLACK,
            star_color: Color::WHITE,
        }
    }
}

/// Read-only view of the selected object for the properties panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedInfo {
    pub object: ObjectId,
    pub name: String,
    pub position: Vec3,
    pub scale: f32,
    pub props: EditorProps,
}

/// Owns every piece of editor state. Input handlers and panels call into it;
/// the frame loop calls [`EditorSession::tick`].
pub struct EditorSession {
    config: SandboxConfig,
    pub scene: Scene,
    selection: Selection,
    history: History,
    key_hold: KeyHoldController,
    pub animation: AnimationSettings,
    pub view: ViewSettings,
    pub controls: OrbitControls,
    rng: StdRng,
    alerts: Vec<String>,
}

impl EditorSession {
    pub fn new(config: SandboxConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: SandboxConfig, rng: StdRng) -> Self {
        Self {
            controls: OrbitControls::new(&config.camera),
            config,
            scene: Scene::new(),
            selection: Selection::default(),
            history: History::new(),
            key_hold: KeyHoldController::default(),
            animation: AnimationSettings::default(),
            view: ViewSettings::default(),
            rng,
            alerts: Vec::new(),
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selection.selected()
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.selection.outline()
    }

    pub fn selected_info(&self) -> Option<SelectedInfo> {
        let object = self.selection.selected()?;
        let node = self.scene.get_object(object)?;

        Some(SelectedInfo {
            object,
            name: node.name.clone(),
            position: node.transform.translation(),
            scale: node.transform.scale().x,
            props: node.editor.clone()?,
        })
    }

    pub fn is_dragging(&self) -> bool {
        self.key_hold.drag().is_some()
    }

    /// Messages for the user, oldest first. Draining them clears the queue.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    fn alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("Alert: {}", message);
        self.alerts.push(message);
    }

    /// Applies a finished asset load. Returns the placed object, if any.
    pub fn apply_load_event(&mut self, event: LoadEvent) -> Option<ObjectId> {
        match (event.origin, event.result) {
            (LoadOrigin::Preload, Ok(model)) => {
                log::info!("Preloaded {} ({} meshes)", event.name, model.mesh_count());
                None
            }
            (LoadOrigin::Preload, Err(err)) => {
                log::warn!("Failed to preload {}: {:?}", event.name, err);
                None
            }
            (_, Ok(model)) => Some(self.place_model(&model)),
            (origin, Err(err)) => {
                log::error!("Failed to load {}: {:?}", event.name, err);
                match origin {
                    LoadOrigin::Upload => self.alert("Could not load custom model."),
                    _ => self.alert(format!("Could not load {} model.", event.name)),
                }
                None
            }
        }
    }

    /// Normalizes `model`, finds it a spot, adds it to the scene, records
    /// the addition and selects it.
    ///
    /// The placed root carries the position and the user-editable scale. A
    /// child node recenters the model and scales it to the target size, so a
    /// scale of 1 always means "normalized size".
    pub fn place_model(&mut self, model: &ModelNode) -> ObjectId {
        self.finish_drag();

        let normalized = placement::normalize(model, self.config.placement.target_size);
        let occupants = self.occupants();
        let placement = placement::place(
            normalized.radius,
            &occupants,
            &mut self.rng,
            &self.config.placement,
        );

        let mut root = Object3D::new(model.name.clone());
        root.editor = Some(EditorProps::placed(normalized.radius));
        root.transform.set_translation(placement.position());
        let root_id = self.scene.add_object(root);

        let mut fit = Object3D::new(format!("{} (fit)", model.name));
        fit.transform.set_translation(-normalized.center * normalized.scale);
        fit.transform.set_scale(Vec3::splat(normalized.scale));
        let fit_id = self.scene.add_object(fit);
        self.scene.set_object_parent(fit_id, Some(root_id));
        self.scene.spawn_model(model, Some(fit_id));

        self.scene.attach(root_id);
        self.history.record(HistoryAction::Add { object: root_id });
        log::info!("Placed {} at {}", model.name, placement.position());

        self.select(root_id);
        root_id
    }

    /// Footprints of every placed object currently in the scene.
    fn occupants(&self) -> Vec<Occupant> {
        self.scene
            .roots()
            .iter()
            .filter_map(|&id| {
                let object = self.scene.get_object(id)?;
                let props = object.editor.as_ref()?;
                Some(Occupant {
                    center: object.transform.translation(),
                    radius: props.radius * object.transform.scale().max_element(),
                })
            })
            .collect()
    }

    pub fn select(&mut self, object: ObjectId) -> bool {
        if self.selection.is_selected(object) {
            return false;
        }

        self.finish_drag();
        self.selection.select(object, &self.scene)
    }

    pub fn deselect(&mut self) -> Option<ObjectId> {
        self.selection.selected()?;
        self.finish_drag();
        self.selection.deselect()
    }

    /// Picks the object under `ray`. Clicking the selected object or empty
    /// space deselects.
    pub fn click(&mut self, ray: &Ray) {
        let hit = self
            .scene
            .raycast(ray)
            .and_then(|(part, _)| resolve_selectable(&self.scene, part));

        match hit {
            Some(object) if self.selection.is_selected(object) => {
                self.deselect();
            }
            Some(object) => {
                self.select(object);
            }
            None => {
                self.deselect();
            }
        }
    }

    pub fn delete_selected(&mut self) -> bool {
        self.finish_drag();

        let Some(object) = self.selection.deselect() else {
            return false;
        };

        self.scene.detach(object);
        self.history.record(HistoryAction::Delete { object });
        log::info!("Deleted {}", self.object_name(object));
        true
    }

    pub fn undo(&mut self) -> bool {
        self.finish_drag();

        let Some(action) = self.history.undo() else {
            return false;
        };

        log::info!("Undo {:?} on {}", action_kind(&action), self.object_name(action.object()));
        match action {
            HistoryAction::Add { object } => self.remove_from_scene(object),
            HistoryAction::Delete { object } => self.restore_to_scene(object),
            HistoryAction::Transform { object, old, .. } => self.apply_transform_state(object, old),
        }
        true
    }

    pub fn redo(&mut self) -> bool {
        self.finish_drag();

        let Some(action) = self.history.redo() else {
            return false;
        };

        log::info!("Redo {:?} on {}", action_kind(&action), self.object_name(action.object()));
        match action {
            HistoryAction::Add { object } => self.restore_to_scene(object),
            HistoryAction::Delete { object } => self.remove_from_scene(object),
            HistoryAction::Transform { object, new, .. } => self.apply_transform_state(object, new),
        }
        true
    }

    fn remove_from_scene(&mut self, object: ObjectId) {
        self.scene.detach(object);
        if self.selection.is_selected(object) {
            self.selection.deselect();
        }
    }

    fn restore_to_scene(&mut self, object: ObjectId) {
        self.scene.attach(object);
        self.selection.select(object, &self.scene);
    }

    fn object_name(&self, object: ObjectId) -> &str {
        self.scene
            .get_object(object)
            .map(|object| object.name.as_str())
            .unwrap_or("<unknown>")
    }

    pub fn transform_state(&self, object: ObjectId) -> Option<TransformState> {
        let transform = self.scene.get_object_transform(object)?;
        Some(TransformState {
            position: transform.translation(),
            scale: transform.scale(),
        })
    }

    fn apply_transform_state(&mut self, object: ObjectId, state: TransformState) {
        self.scene.set_object_translation(object, state.position);
        self.scene.set_object_scale(object, state.scale);
        self.selection.refresh(&self.scene);
    }

    /// Arrow key down. The first key of a gesture starts a drag of the
    /// selected object with the given axis mode.
    pub fn move_key_down(&mut self, key: MoveKey, mode: AxisMode, now: Instant) {
        if !self.key_hold.press(key) {
            return;
        }

        let Some(object) = self.selection.selected() else {
            return;
        };
        let Some(snapshot) = self.transform_state(object) else {
            return;
        };

        log::debug!("Drag of {} started in {:?} mode", self.object_name(object), mode);
        self.key_hold.begin(Drag {
            object,
            started_at: now,
            snapshot,
            mode,
        });
    }

    pub fn move_key_up(&mut self, key: MoveKey) {
        if self.key_hold.release(key) {
            let drag = self.key_hold.end();
            self.commit_drag(drag);
        }
    }

    /// The window lost focus; key releases will not arrive.
    pub fn focus_lost(&mut self) {
        self.finish_drag();
    }

    fn finish_drag(&mut self) {
        let drag = self.key_hold.cancel();
        self.commit_drag(drag);
    }

    fn commit_drag(&mut self, drag: Option<Drag>) {
        let Some(drag) = drag else {
            return;
        };
        let Some(current) = self.transform_state(drag.object) else {
            return;
        };

        if current != drag.snapshot {
            self.history.record(HistoryAction::Transform {
                object: drag.object,
                old: drag.snapshot,
                new: current,
            });
            log::info!(
                "Moved {} to {} at scale {}",
                self.object_name(drag.object),
                current.position,
                current.scale.x
            );
        }
    }

    /// One frame of editor time: drag, animation, camera and outline.
    pub fn tick(&mut self, now: Instant) {
        if let Some(drag) = self.key_hold.drag().copied() {
            let next = self.transform_state(drag.object).and_then(|current| {
                self.key_hold.advance(now, current, &self.config.transform)
            });

            if let Some(next) = next {
                self.scene.set_object_translation(drag.object, next.position);
                self.scene.set_object_scale(drag.object, next.scale);
            }
        }

        animation::advance(&mut self.scene, &self.animation, &self.config.animation);
        self.controls.update();
        self.selection.refresh(&self.scene);
    }

    /// Sets position, scale and animation speed of the selected object.
    pub fn apply_properties(&mut self, edit: PropertyEdit) -> bool {
        let Some(object) = self.selection.selected() else {
            return false;
        };
        self.finish_drag();

        let edit = edit.sanitized(self.config.animation.max_speed);
        self.scene.set_object_translation(object, edit.position);
        self.scene.set_object_scale(object, Vec3::splat(edit.scale));
        if let Some(props) = self.editor_props_mut(object) {
            props.animation_speed = edit.animation_speed;
        }
        self.selection.refresh(&self.scene);
        true
    }

    fn editor_props_mut(&mut self, object: ObjectId) -> Option<&mut EditorProps> {
        self.scene.get_object_mut(object)?.editor.as_mut()
    }

    pub fn toggle_spin(&mut self) -> bool {
        let Some(props) = self
            .selection
            .selected()
            .and_then(|object| self.scene.get_object_mut(object)?.editor.as_mut())
        else {
            self.alert("Select an object to spin");
            return false;
        };

        props.spinning = !props.spinning;
        true
    }

    pub fn toggle_orbit(&mut self) -> bool {
        let Some(props) = self
            .selection
            .selected()
            .and_then(|object| self.scene.get_object_mut(object)?.editor.as_mut())
        else {
            self.alert("Select an object to orbit");
            return false;
        };

        props.orbiting = !props.orbiting;
        true
    }

    /// Moves the selected object to the origin. Not recorded in history.
    pub fn center_selected(&mut self) -> bool {
        let Some(object) = self.selection.selected() else {
            self.alert("Select an object to center");
            return false;
        };
        self.finish_drag();

        self.scene.set_object_translation(object, Vec3::ZERO);
        self.selection.refresh(&self.scene);
        true
    }

    pub fn set_background(&mut self, color: Color) {
        self.view.background = color;
        self.view.star_color = color.star_contrast();
    }

    /// Applies a `#RRGGBB` background. Invalid input keeps the current one.
    pub fn set_background_hex(&mut self, input: &str) -> bool {
        match Color::parse_hex(input.trim()) {
            Ok(color) => {
                self.set_background(color);
                true
            }
            Err(err) => {
                log::warn!("Rejected background color: {}", err);
                self.alert(INVALID_COLOR_ALERT);
                false
            }
        }
    }

    pub fn execute(&mut self, command: EditorCommand) {
        match command {
            EditorCommand::DeleteSelected => {
                self.delete_selected();
            }
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::ApplyProperties(edit) => {
                self.apply_properties(edit);
            }
            EditorCommand::ToggleSpin => {
                self.toggle_spin();
            }
            EditorCommand::ToggleOrbit => {
                self.toggle_orbit();
            }
            EditorCommand::CenterSelected => {
                self.center_selected();
            }
            EditorCommand::SetGlobalSpin(enabled) => self.animation.global_spin = enabled,
            EditorCommand::SetGlobalOrbit(enabled) => self.animation.global_orbit = enabled,
            EditorCommand::SetGlobalSpeed(speed) => {
                self.animation.global_speed = speed.clamp(0.0, self.config.animation.max_speed)
            }
            EditorCommand::TogglePause => self.animation.paused = !self.animation.paused,
            EditorCommand::ToggleGrid => self.view.grid_visible = !self.view.grid_visible,
            EditorCommand::ToggleStarfield => {
                self.view.starfield_visible = !self.view.starfield_visible
            }
            EditorCommand::TogglePanels => self.view.panels_visible = !self.view.panels_visible,
            EditorCommand::SetBackground(color) => self.set_background(color),
            EditorCommand::SetBackgroundHex(input) => {
                self.set_background_hex(&input);
            }
            EditorCommand::RecenterCamera => self.controls.reset(),
        }
    }
}

fn action_kind(action: &HistoryAction) -> &'static str {
    match action {
        HistoryAction::Add { .. } => "add",
        HistoryAction::Delete { .. } => "delete",
        HistoryAction::Transform { .. } => "transform",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::assets::loader::LoadTicket;
    use crate::assets::LoadError;
    use crate::math::bounds::AABB;

    fn session() -> EditorSession {
        EditorSession::with_rng(SandboxConfig::default(), StdRng::seed_from_u64(11))
    }

    fn planet(name: &str, size: f32) -> ModelNode {
        ModelNode::group(
            name,
            vec![ModelNode::mesh(
                "Sphere",
                AABB::new(Vec3::splat(-size / 2.0), Vec3::splat(size / 2.0)),
            )],
        )
    }

    fn loaded(name: &str, origin: LoadOrigin, result: Result<ModelNode, LoadError>) -> LoadEvent {
        LoadEvent {
            ticket: LoadTicket::for_tests(1),
            name: name.to_string(),
            origin,
            result,
        }
    }

    fn hold(session: &mut EditorSession, key: MoveKey, mode: AxisMode, duration: Duration) {
        let start = Instant::now();
        session.move_key_down(key, mode, start);
        let mut elapsed = Duration::ZERO;
        while elapsed < duration {
            elapsed += Duration::from_millis(16);
            session.tick(start + elapsed);
        }
        session.move_key_up(key);
    }

    #[test]
    fn loading_earth_places_and_selects_it() {
        let mut session = session();
        let earth = session
            .apply_load_event(loaded("Earth", LoadOrigin::Library, Ok(planet("Earth", 12.0))))
            .unwrap();

        assert_eq!(session.selected(), Some(earth));
        assert_eq!(session.scene.roots(), &[earth]);
        assert_eq!(session.history().undo_len(), 1);

        let position = session.scene.objects[earth].transform.translation();
        let half = session.config().placement.region_size / 2.0;
        assert!(position.x.abs() <= half && position.z.abs() <= half);
        assert_eq!(position.y, 0.0);

        // Normalized to the target size and centered on the placed position
        let bounds = session.scene.world_bounds(earth).unwrap();
        assert!((bounds.max_dimension() - 500.0).abs() < 1e-2);
        assert!(bounds.center().distance(position) < 1e-2);
        assert_eq!(session.outline().unwrap().bounds, Some(bounds));
    }

    #[test]
    fn placed_objects_do_not_overlap() {
        let mut session = session();
        let ids: Vec<ObjectId> = (0..4)
            .map(|i| session.place_model(&planet(&format!("P{i}"), 1.0)))
            .collect();

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let pa = session.scene.objects[a].transform.translation();
                let pb = session.scene.objects[b].transform.translation();
                let planar = glam::Vec2::new(pa.x - pb.x, pa.z - pb.z).length();
                assert!(planar >= 250.0 + 250.0 + 50.0);
            }
        }
    }

    #[test]
    fn failed_loads_alert_without_touching_scene() {
        let mut session = session();
        let missing = || Err(LoadError::EmptyModel("x".to_string()));

        assert!(session.apply_load_event(loaded("Pluto", LoadOrigin::Library, missing())).is_none());
        assert!(session.apply_load_event(loaded("ship", LoadOrigin::Upload, missing())).is_none());
        assert!(session.apply_load_event(loaded("Mars", LoadOrigin::Preload, missing())).is_none());
        assert!(session
            .apply_load_event(loaded("Mars", LoadOrigin::Preload, Ok(planet("Mars", 1.0))))
            .is_none());

        assert_eq!(
            session.take_alerts(),
            vec!["Could not load Pluto model.", "Could not load custom model."]
        );
        assert!(session.scene.roots().is_empty());
        assert!(!session.history().can_undo());
    }

    #[test]
    fn delete_undo_redo_of_only_object() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));

        assert!(session.delete_selected());
        assert!(session.scene.roots().is_empty());
        assert_eq!(session.selected(), None);

        assert!(session.undo());
        assert_eq!(session.scene.roots(), &[earth]);
        assert_eq!(session.selected(), Some(earth));

        assert!(session.redo());
        assert!(session.scene.roots().is_empty());
        assert_eq!(session.selected(), None);
        assert!(!session.delete_selected());
    }

    #[test]
    fn undo_then_redo_restores_state() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));
        hold(&mut session, MoveKey::Right, AxisMode::Planar, Duration::from_millis(300));
        let moved = session.transform_state(earth).unwrap();

        assert!(session.undo());
        assert_ne!(session.transform_state(earth).unwrap(), moved);

        assert!(session.redo());
        assert_eq!(session.transform_state(earth).unwrap(), moved);

        // Undo the transform and the add, then redo both
        session.undo();
        session.undo();
        assert!(session.scene.roots().is_empty());
        assert_eq!(session.selected(), None);
        session.redo();
        session.redo();
        assert_eq!(session.scene.roots(), &[earth]);
        assert_eq!(session.transform_state(earth).unwrap(), moved);
    }

    #[test]
    fn drag_records_one_history_entry() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));
        let before = session.transform_state(earth).unwrap();

        let start = Instant::now();
        session.move_key_down(MoveKey::Up, AxisMode::Planar, start);
        session.move_key_down(MoveKey::Left, AxisMode::Vertical, start);
        for frame in 1..=30 {
            session.tick(start + Duration::from_millis(16 * frame));
        }
        session.move_key_up(MoveKey::Up);
        assert!(session.is_dragging());
        session.move_key_up(MoveKey::Left);
        assert!(!session.is_dragging());

        assert_eq!(session.history().undo_len(), 2);
        let after = session.transform_state(earth).unwrap();
        // Mode stays planar for the whole gesture
        assert_eq!(after.position.y, before.position.y);
        assert!(after.position.z < before.position.z);
        assert!(after.position.x < before.position.x);

        session.undo();
        assert_eq!(session.transform_state(earth).unwrap(), before);
    }

    #[test]
    fn longer_hold_drags_further() {
        let mut short = session();
        let a = short.place_model(&planet("A", 1.0));
        let start_a = short.transform_state(a).unwrap().position;
        hold(&mut short, MoveKey::Down, AxisMode::Vertical, Duration::from_millis(150));

        let mut long = session();
        let b = long.place_model(&planet("B", 1.0));
        let start_b = long.transform_state(b).unwrap().position;
        hold(&mut long, MoveKey::Down, AxisMode::Vertical, Duration::from_millis(1500));

        let short_distance = start_a.distance(short.transform_state(a).unwrap().position);
        let long_distance = start_b.distance(long.transform_state(b).unwrap().position);
        assert!(long_distance > short_distance);
    }

    #[test]
    fn scale_drag_stops_at_minimum() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));
        hold(&mut session, MoveKey::Down, AxisMode::Scale, Duration::from_secs(3));

        assert_eq!(session.transform_state(earth).unwrap().scale, Vec3::splat(0.1));
    }

    #[test]
    fn focus_loss_ends_drag() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));
        let start = Instant::now();

        session.move_key_down(MoveKey::Up, AxisMode::Planar, start);
        session.tick(start + Duration::from_millis(16));
        session.focus_lost();
        assert!(!session.is_dragging());
        assert_eq!(session.history().undo_len(), 2);

        let after_blur = session.transform_state(earth).unwrap();
        session.tick(start + Duration::from_millis(32));
        assert_eq!(session.transform_state(earth).unwrap(), after_blur);
    }

    #[test]
    fn deleting_during_drag_commits_then_deletes() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));
        let start = Instant::now();

        session.move_key_down(MoveKey::Up, AxisMode::Planar, start);
        session.tick(start + Duration::from_millis(16));
        session.delete_selected();

        assert!(!session.is_dragging());
        assert_eq!(session.history().undo_len(), 3);
        session.undo();
        assert_eq!(session.selected(), Some(earth));
    }

    #[test]
    fn click_selects_and_toggles() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));
        let position = session.scene.objects[earth].transform.translation();
        let down = Ray::new(position + Vec3::new(0.0, 5000.0, 0.0), Vec3::NEG_Y);

        session.click(&down);
        assert_eq!(session.selected(), None);
        session.click(&down);
        assert_eq!(session.selected(), Some(earth));

        let miss = Ray::new(Vec3::new(100_000.0, 5000.0, 0.0), Vec3::NEG_Y);
        session.click(&miss);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn selection_ops_require_selection() {
        let mut session = session();
        assert!(!session.toggle_spin());
        assert!(!session.toggle_orbit());
        assert!(!session.center_selected());
        assert_eq!(
            session.take_alerts(),
            vec![
                "Select an object to spin",
                "Select an object to orbit",
                "Select an object to center"
            ]
        );
        assert!(session.take_alerts().is_empty());
    }

    #[test]
    fn center_and_properties_are_not_recorded() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));

        session.execute(EditorCommand::ApplyProperties(PropertyEdit {
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: 0.0,
            animation_speed: 2.5,
        }));
        let info = session.selected_info().unwrap();
        assert_eq!(info.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(info.scale, 1.0);
        assert_eq!(info.props.animation_speed, 2.5);

        assert!(session.center_selected());
        assert_eq!(session.transform_state(earth).unwrap().position, Vec3::ZERO);
        assert_eq!(session.history().undo_len(), 1);
    }

    #[test]
    fn background_changes_update_star_contrast() {
        let mut session = session();

        session.execute(EditorCommand::SetBackgroundHex("#FFFFFF".to_string()));
        assert_eq!(session.view.background, Color::WHITE);
        assert_eq!(session.view.star_color, Color::BLACK);

        session.execute(EditorCommand::SetBackgroundHex("white".to_string()));
        assert_eq!(session.view.background, Color::WHITE);
        assert_eq!(session.take_alerts(), vec![INVALID_COLOR_ALERT]);

        session.execute(EditorCommand::SetBackground(Color::BLACK));
        assert_eq!(session.view.star_color, Color::WHITE);
    }

    #[test]
    fn toggles_flip_view_and_animation_flags() {
        let mut session = session();
        let earth = session.place_model(&planet("Earth", 1.0));

        session.execute(EditorCommand::ToggleGrid);
        session.execute(EditorCommand::ToggleStarfield);
        session.execute(EditorCommand::TogglePanels);
        session.execute(EditorCommand::TogglePause);
        session.execute(EditorCommand::ToggleSpin);
        session.execute(EditorCommand::SetGlobalSpeed(42.0));

        assert!(!session.view.grid_visible);
        assert!(!session.view.starfield_visible);
        assert!(!session.view.panels_visible);
        assert!(session.animation.paused);
        assert_eq!(session.animation.global_speed, 5.0);
        assert!(session.scene.objects[earth].editor.as_ref().unwrap().spinning);
    }
}
