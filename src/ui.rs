//! imgui panels. Panels only read the session; every change they request is
//! returned as an [`AppCommand`] and applied by the window after the frame.

use std::collections::VecDeque;
use std::path::PathBuf;

use glam::Vec3;
use imgui::{Condition, ProgressBar};

use crate::assets::LoadProgress;
use crate::config::SandboxConfig;
use crate::editor::background::{presets, BackgroundPreset};
use crate::editor::session::SelectedInfo;
use crate::editor::transform::PropertyEdit;
use crate::editor::{EditorCommand, EditorSession};

const ALERT_POPUP: &str = "Alert";
const PANEL_WIDTH: f32 = 280.0;

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Editor(EditorCommand),
    AddModel(String),
    LoadCustomModel(PathBuf),
    Screenshot,
}

impl From<EditorCommand> for AppCommand {
    fn from(command: EditorCommand) -> Self {
        AppCommand::Editor(command)
    }
}

#[derive(Debug, Clone)]
pub struct AddMenu {
    pub library: Vec<String>,
    pub custom_model: bool,
}

#[derive(Debug, Clone)]
pub struct ScenePanel {
    pub presets: Vec<BackgroundPreset>,
    pub custom_color: bool,
}

#[derive(Debug, Clone)]
pub struct PropertiesPanel;

#[derive(Debug, Clone)]
pub struct HistoryPanel;

/// Which controls exist. Absent panels are never drawn.
#[derive(Debug, Clone, Default)]
pub struct ControlSurface {
    pub add_menu: Option<AddMenu>,
    pub scene_panel: Option<ScenePanel>,
    pub properties_panel: Option<PropertiesPanel>,
    pub history_panel: Option<HistoryPanel>,
}

impl ControlSurface {
    pub fn full(config: &SandboxConfig) -> Self {
        Self {
            add_menu: Some(AddMenu {
                library: config.assets.library.clone(),
                custom_model: true,
            }),
            scene_panel: Some(ScenePanel {
                presets: presets().to_vec(),
                custom_color: true,
            }),
            properties_panel: Some(PropertiesPanel),
            history_panel: Some(HistoryPanel),
        }
    }

    /// Panels to draw this frame, in drawing order. Missing panels are left
    /// out, and nothing is drawn while the panels are hidden.
    pub fn visible_panels(&self, panels_visible: bool) -> Vec<Panel<'_>> {
        if !panels_visible {
            return Vec::new();
        }

        let mut panels = Vec::new();
        if let Some(add_menu) = &self.add_menu {
            panels.push(Panel::Add(add_menu));
        }
        if let Some(scene_panel) = &self.scene_panel {
            panels.push(Panel::Scene(scene_panel));
        }
        if self.properties_panel.is_some() {
            panels.push(Panel::Properties);
        }
        if self.history_panel.is_some() {
            panels.push(Panel::History);
        }
        panels
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Panel<'a> {
    Add(&'a AddMenu),
    Scene(&'a ScenePanel),
    Properties,
    History,
}

#[derive(Debug, Default)]
pub struct UiState {
    hex_input: String,
    model_path: String,
    alerts: VecDeque<String>,
    alert_open: bool,
}

impl UiState {
    pub fn push_alerts(&mut self, alerts: impl IntoIterator<Item = String>) {
        self.alerts.extend(alerts);
    }

    pub fn pending_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
        self.alert_open = false;
    }

    /// True once per alert, on the frame it reaches the front of the queue.
    fn take_alert_to_open(&mut self) -> bool {
        if self.alert_open || self.alerts.is_empty() {
            return false;
        }

        self.alert_open = true;
        true
    }
}

/// Edit built from the properties panel fields. Returns `None` when nothing
/// differs from the selected object.
pub fn property_edit(
    info: &SelectedInfo,
    position: [f32; 3],
    scale: f32,
    animation_speed: f32,
) -> Option<PropertyEdit> {
    let edit = PropertyEdit {
        position: Vec3::from_array(position),
        scale,
        animation_speed,
    };

    let unchanged = edit.position == info.position
        && edit.scale == info.scale
        && edit.animation_speed == info.props.animation_speed;

    (!unchanged).then_some(edit)
}

pub fn draw(
    ui: &imgui::Ui,
    surface: &ControlSurface,
    state: &mut UiState,
    session: &EditorSession,
    progress: LoadProgress,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();

    for panel in surface.visible_panels(session.view.panels_visible) {
        match panel {
            Panel::Add(add_menu) => draw_add_menu(ui, add_menu, state, &mut commands),
            Panel::Scene(scene_panel) => {
                draw_scene_panel(ui, scene_panel, state, session, &mut commands)
            }
            Panel::Properties => draw_properties_panel(ui, session, &mut commands),
            Panel::History => draw_history_panel(ui, session, &mut commands),
        }
    }

    if !progress.is_complete() {
        draw_progress(ui, progress);
    }

    draw_alert(ui, state);

    commands
}

fn draw_add_menu(
    ui: &imgui::Ui,
    add_menu: &AddMenu,
    state: &mut UiState,
    commands: &mut Vec<AppCommand>,
) {
    ui.window("Add")
        .position([10.0, 10.0], Condition::FirstUseEver)
        .size([PANEL_WIDTH, 260.0], Condition::FirstUseEver)
        .build(|| {
            for name in &add_menu.library {
                if ui.button(name) {
                    commands.push(AppCommand::AddModel(name.clone()));
                }
            }

            if add_menu.custom_model {
                ui.separator();
                ui.text("Custom model (.glb)");
                ui.input_text("##model_path", &mut state.model_path).build();
                ui.same_line();
                if ui.button("Load") && !state.model_path.trim().is_empty() {
                    commands.push(AppCommand::LoadCustomModel(PathBuf::from(
                        state.model_path.trim(),
                    )));
                }
            }
        });
}

fn draw_scene_panel(
    ui: &imgui::Ui,
    scene_panel: &ScenePanel,
    state: &mut UiState,
    session: &EditorSession,
    commands: &mut Vec<AppCommand>,
) {
    ui.window("Scene")
        .position([10.0, 280.0], Condition::FirstUseEver)
        .size([PANEL_WIDTH, 330.0], Condition::FirstUseEver)
        .build(|| {
            ui.text("Background");
            for preset in &scene_panel.presets {
                if ui.button(preset.label) {
                    commands.push(EditorCommand::SetBackground(preset.color).into());
                }
            }

            if scene_panel.custom_color {
                ui.input_text("##background_hex", &mut state.hex_input)
                    .hint(session.view.background.to_hex())
                    .build();
                ui.same_line();
                if ui.button("Apply") {
                    commands.push(EditorCommand::SetBackgroundHex(state.hex_input.clone()).into());
                }
            }

            ui.separator();

            let mut grid = session.view.grid_visible;
            if ui.checkbox("Grid", &mut grid) {
                commands.push(EditorCommand::ToggleGrid.into());
            }
            let mut starfield = session.view.starfield_visible;
            if ui.checkbox("Stars", &mut starfield) {
                commands.push(EditorCommand::ToggleStarfield.into());
            }

            ui.separator();

            let animation = &session.animation;
            let mut spin_all = animation.global_spin;
            if ui.checkbox("Spin all", &mut spin_all) {
                commands.push(EditorCommand::SetGlobalSpin(spin_all).into());
            }
            let mut orbit_all = animation.global_orbit;
            if ui.checkbox("Orbit all", &mut orbit_all) {
                commands.push(EditorCommand::SetGlobalOrbit(orbit_all).into());
            }
            let mut paused = animation.paused;
            if ui.checkbox("Paused", &mut paused) {
                commands.push(EditorCommand::TogglePause.into());
            }
            let mut speed = animation.global_speed;
            if ui.slider("Speed", 0.0, session.config().animation.max_speed, &mut speed) {
                commands.push(EditorCommand::SetGlobalSpeed(speed).into());
            }

            ui.separator();

            if ui.button("Recenter camera") {
                commands.push(EditorCommand::RecenterCamera.into());
            }
            ui.same_line();
            if ui.button("Screenshot") {
                commands.push(AppCommand::Screenshot);
            }
        });
}

fn draw_properties_panel(
    ui: &imgui::Ui,
    session: &EditorSession,
    commands: &mut Vec<AppCommand>,
) {
    let Some(info) = session.selected_info() else {
        return;
    };

    let display_size = ui.io().display_size;
    ui.window("Properties")
        .position(
            [display_size[0] - PANEL_WIDTH - 10.0, 10.0],
            Condition::FirstUseEver,
        )
        .size([PANEL_WIDTH, 250.0], Condition::FirstUseEver)
        .build(|| {
            ui.text(&info.name);
            ui.separator();

            let mut position = info.position.to_array();
            let mut scale = info.scale;
            let mut speed = info.props.animation_speed;

            let mut changed = ui.input_float3("Position", &mut position).build();
            changed |= ui.input_float("Scale", &mut scale).step(0.1).build();
            changed |= ui.input_float("Anim speed", &mut speed).step(0.1).build();

            if changed {
                if let Some(edit) = property_edit(&info, position, scale, speed) {
                    commands.push(EditorCommand::ApplyProperties(edit).into());
                }
            }

            ui.separator();

            let spin_label = if info.props.spinning { "Stop spin" } else { "Spin" };
            if ui.button(spin_label) {
                commands.push(EditorCommand::ToggleSpin.into());
            }
            ui.same_line();
            let orbit_label = if info.props.orbiting { "Stop orbit" } else { "Orbit" };
            if ui.button(orbit_label) {
                commands.push(EditorCommand::ToggleOrbit.into());
            }
            ui.same_line();
            if ui.button("Center") {
                commands.push(EditorCommand::CenterSelected.into());
            }

            if ui.button("Delete") {
                commands.push(EditorCommand::DeleteSelected.into());
            }
        });
}

fn draw_history_panel(ui: &imgui::Ui, session: &EditorSession, commands: &mut Vec<AppCommand>) {
    let history = session.history();
    let display_size = ui.io().display_size;

    ui.window("History")
        .position(
            [display_size[0] - PANEL_WIDTH - 10.0, 270.0],
            Condition::FirstUseEver,
        )
        .size([PANEL_WIDTH, 70.0], Condition::FirstUseEver)
        .build(|| {
            ui.disabled(!history.can_undo(), || {
                if ui.button(format!("Undo ({})", history.undo_len())) {
                    commands.push(EditorCommand::Undo.into());
                }
            });
            ui.same_line();
            ui.disabled(!history.can_redo(), || {
                if ui.button(format!("Redo ({})", history.redo_len())) {
                    commands.push(EditorCommand::Redo.into());
                }
            });
        });
}

fn draw_progress(ui: &imgui::Ui, progress: LoadProgress) {
    let display_size = ui.io().display_size;

    ui.window("Loading")
        .position(
            [display_size[0] / 2.0, display_size[1] / 2.0],
            Condition::Always,
        )
        .position_pivot([0.5, 0.5])
        .always_auto_resize(true)
        .no_decoration()
        .build(|| {
            let label = progress.label();
            ui.text(&label);
            ProgressBar::new(progress.fraction())
                .size([240.0, 0.0])
                .overlay_text(&label)
                .build(ui);
        });
}

fn draw_alert(ui: &imgui::Ui, state: &mut UiState) {
    let Some(message) = state.pending_alert().map(str::to_owned) else {
        return;
    };

    if state.take_alert_to_open() {
        ui.open_popup(ALERT_POPUP);
    }

    let dismissed = ui
        .modal_popup_config(ALERT_POPUP)
        .always_auto_resize(true)
        .build(|| {
            ui.text(&message);
            if ui.button("OK") {
                ui.close_current_popup();
                true
            } else {
                false
            }
        })
        .unwrap_or(false);

    if dismissed {
        state.dismiss_alert();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::EditorProps;

    fn info() -> SelectedInfo {
        let mut arena = id_arena::Arena::<crate::scene_graph::Object3D>::new();
        SelectedInfo {
            object: arena.alloc(crate::scene_graph::Object3D::new("Earth")),
            name: "Earth".to_string(),
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: 1.0,
            props: EditorProps::placed(100.0),
        }
    }

    #[test]
    fn unchanged_fields_produce_no_edit() {
        let info = info();
        let speed = info.props.animation_speed;
        assert_eq!(property_edit(&info, [1.0, 2.0, 3.0], 1.0, speed), None);
    }

    #[test]
    fn changed_field_produces_full_edit() {
        let info = info();
        let speed = info.props.animation_speed;
        let edit = property_edit(&info, [1.0, 5.0, 3.0], 1.0, speed).unwrap();

        assert_eq!(edit.position, Vec3::new(1.0, 5.0, 3.0));
        assert_eq!(edit.scale, 1.0);
        assert_eq!(edit.animation_speed, speed);
    }

    #[test]
    fn full_surface_lists_library_and_presets() {
        let config = SandboxConfig::default();
        let surface = ControlSurface::full(&config);

        let add_menu = surface.add_menu.unwrap();
        assert_eq!(add_menu.library, config.assets.library);
        assert_eq!(surface.scene_panel.unwrap().presets.len(), 5);
        assert!(surface.properties_panel.is_some());
    }

    #[test]
    fn alerts_are_shown_in_order() {
        let mut state = UiState::default();
        state.push_alerts(["first".to_string(), "second".to_string()]);

        assert_eq!(state.pending_alert(), Some("first"));
        state.dismiss_alert();
        assert_eq!(state.pending_alert(), Some("second"));
        state.dismiss_alert();
        assert_eq!(state.pending_alert(), None);
    }

    #[test]
    fn each_alert_opens_its_popup_once() {
        let mut state = UiState::default();
        assert!(!state.take_alert_to_open());

        state.push_alerts(["first".to_string(), "second".to_string()]);
        assert!(state.take_alert_to_open());
        assert!(!state.take_alert_to_open());

        state.dismiss_alert();
        assert!(state.take_alert_to_open());
        state.dismiss_alert();
        assert!(!state.take_alert_to_open());
    }

    #[test]
    fn missing_panels_are_never_drawn() {
        let surface = ControlSurface {
            add_menu: Some(AddMenu {
                library: vec!["Earth".to_string()],
                custom_model: false,
            }),
            history_panel: Some(HistoryPanel),
            ..Default::default()
        };

        let panels = surface.visible_panels(true);
        assert_eq!(panels.len(), 2);
        assert!(matches!(panels[0], Panel::Add(menu) if menu.library == ["Earth"]));
        assert!(matches!(panels[1], Panel::History));

        assert!(surface.visible_panels(false).is_empty());
        assert!(ControlSurface::default().visible_panels(true).is_empty());
    }

    #[test]
    fn full_surface_draws_every_panel() {
        let surface = ControlSurface::full(&SandboxConfig::default());
        let panels = surface.visible_panels(true);

        assert!(matches!(
            panels.as_slice(),
            [Panel::Add(_), Panel::Scene(_), Panel::Properties, Panel::History]
        ));
    }

    #[test]
    fn editor_commands_convert() {
        assert_eq!(
            AppCommand::from(EditorCommand::Undo),
            AppCommand::Editor(EditorCommand::Undo)
        );
    }
}
