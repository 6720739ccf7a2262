//! Keyboard-driven moving and scaling of the selected object.
//!
//! Holding arrow keys drags the object with a speed that ramps up the longer
//! the keys are held. The whole gesture, from the first key down to the last
//! key up, becomes a single history entry.

use std::time::{Duration, Instant};

use glam::Vec3;

use crate::config::TransformConfig;
use crate::scene_graph::ObjectId;

/// The editable part of an object's transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub position: Vec3,
    pub scale: Vec3,
}

/// Values entered in the properties panel for the selected object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyEdit {
    pub position: Vec3,
    pub scale: f32,
    pub animation_speed: f32,
}

impl PropertyEdit {
    /// Non-finite coordinates become 0, a scale that is not a positive number
    /// becomes 1 and the animation speed is kept within `0..=max_speed`.
    pub fn sanitized(self, max_speed: f32) -> Self {
        let position = Vec3::from_array(
            self.position
                .to_array()
                .map(|c| if c.is_finite() { c } else { 0.0 }),
        );
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        let animation_speed = if self.animation_speed.is_finite() {
            self.animation_speed.clamp(0.0, max_speed)
        } else {
            1.0
        };

        Self {
            position,
            scale,
            animation_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl HeldKeys {
    fn slot(&mut self, key: MoveKey) -> &mut bool {
        match key {
            MoveKey::Up => &mut self.up,
            MoveKey::Down => &mut self.down,
            MoveKey::Left => &mut self.left,
            MoveKey::Right => &mut self.right,
        }
    }

    pub fn with(mut self, key: MoveKey) -> Self {
        *self.slot(key) = true;
        self
    }

    pub fn contains(&self, key: MoveKey) -> bool {
        match key {
            MoveKey::Up => self.up,
            MoveKey::Down => self.down,
            MoveKey::Left => self.left,
            MoveKey::Right => self.right,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }
}

/// Which part of the transform the arrows drive. Latched when a drag starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AxisMode {
    /// Up/down move along Z, left/right along X.
    #[default]
    Planar,
    /// Up/down move along Y.
    Vertical,
    /// Up/down scale uniformly.
    Scale,
}

impl AxisMode {
    pub fn from_modifiers(command: bool, shift: bool) -> Self {
        if command {
            AxisMode::Scale
        } else if shift {
            AxisMode::Vertical
        } else {
            AxisMode::Planar
        }
    }
}

/// 1 for the first moments of a hold, then quadratic growth up to the cap.
pub fn speed_multiplier(held: Duration, config: &TransformConfig) -> f32 {
    let held_ms = held.as_secs_f32() * 1000.0;
    if held_ms <= config.ramp_delay_ms {
        return 1.0;
    }

    let ramp = (held_ms - config.ramp_delay_ms) / 1000.0;
    (1.0 + ramp * ramp * config.ramp_gain).min(config.max_speed_multiplier)
}

/// One frame of a drag.
pub fn step(
    mode: AxisMode,
    keys: HeldKeys,
    held: Duration,
    state: TransformState,
    config: &TransformConfig,
) -> TransformState {
    let multiplier = speed_multiplier(held, config);
    let move_step = config.move_step * multiplier;
    let scale_step = config.scale_step * multiplier;
    let mut next = state;

    match mode {
        AxisMode::Scale => {
            if keys.contains(MoveKey::Up) {
                next.scale = Vec3::splat(next.scale.x + scale_step);
            }
            if keys.contains(MoveKey::Down) {
                next.scale = Vec3::splat((next.scale.x - scale_step).max(config.min_scale));
            }
        }
        AxisMode::Vertical => {
            if keys.contains(MoveKey::Up) {
                next.position.y += move_step;
            }
            if keys.contains(MoveKey::Down) {
                next.position.y -= move_step;
            }
        }
        AxisMode::Planar => {
            if keys.contains(MoveKey::Up) {
                next.position.z -= move_step;
            }
            if keys.contains(MoveKey::Down) {
                next.position.z += move_step;
            }
            if keys.contains(MoveKey::Left) {
                next.position.x -= move_step;
            }
            if keys.contains(MoveKey::Right) {
                next.position.x += move_step;
            }
        }
    }

    next
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub object: ObjectId,
    pub started_at: Instant,
    pub snapshot: TransformState,
    pub mode: AxisMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(Drag),
}

/// Tracks held movement keys and the drag they drive.
#[derive(Debug, Default)]
pub struct KeyHoldController {
    held: HeldKeys,
    state: DragState,
}

impl KeyHoldController {
    /// Returns true when this press starts a gesture, i.e. no other movement
    /// key was held. Repeats of a held key return false.
    pub fn press(&mut self, key: MoveKey) -> bool {
        if self.held.contains(key) {
            return false;
        }

        let first = self.held.is_empty();
        *self.held.slot(key) = true;
        first
    }

    /// Returns true when no movement key remains held.
    pub fn release(&mut self, key: MoveKey) -> bool {
        *self.held.slot(key) = false;
        self.held.is_empty()
    }

    pub fn begin(&mut self, drag: Drag) {
        self.state = DragState::Dragging(drag);
    }

    pub fn drag(&self) -> Option<&Drag> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    pub fn held(&self) -> HeldKeys {
        self.held
    }

    /// Stops the drag, keeping key tracking.
    pub fn end(&mut self) -> Option<Drag> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    /// Stops the drag and forgets every held key, e.g. when focus is lost.
    pub fn cancel(&mut self) -> Option<Drag> {
        self.held = HeldKeys::default();
        self.end()
    }

    /// Next state of the dragged object, or `None` when idle.
    pub fn advance(
        &self,
        now: Instant,
        current: TransformState,
        config: &TransformConfig,
    ) -> Option<TransformState> {
        let drag = self.drag()?;
        if self.held.is_empty() {
            return None;
        }

        let held = now.saturating_duration_since(drag.started_at);
        Some(step(drag.mode, self.held, held, current, config))
    }
}
