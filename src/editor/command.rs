use crate::editor::background::Color;
use crate::editor::transform::PropertyEdit;

/// Everything the keyboard and the panels can ask the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    DeleteSelected,
    Undo,
    Redo,
    ApplyProperties(PropertyEdit),
    ToggleSpin,
    ToggleOrbit,
    CenterSelected,
    SetGlobalSpin(bool),
    SetGlobalOrbit(bool),
    SetGlobalSpeed(f32),
    TogglePause,
    ToggleGrid,
    ToggleStarfield,
    TogglePanels,
    SetBackground(Color),
    SetBackgroundHex(String),
    RecenterCamera,
}
