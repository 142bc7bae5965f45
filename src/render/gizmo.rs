//! Transform gizmo state.
//!
//! The gizmo attaches to the selected node and turns pointer drags into
//! translation/rotation/scale edits, optionally quantized to snap
//! increments. A drag that ends with no net change to the transform is
//! not reported as a change.

use glam::Vec3;
use uuid::Uuid;

use crate::scene::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoMode {
    Translate,
    Rotate,
    Scale,
}

/// Minimum edit increments. `None` means free-form.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapSettings {
    pub translation: Option<f32>,
    pub rotation: Option<f32>,
    pub scale: Option<f32>,
}

pub struct TransformGizmo {
    mode: GizmoMode,
    snap: SnapSettings,
    attached: Option<Uuid>,
    drag_origin: Option<Transform>,
}

impl Default for TransformGizmo {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformGizmo {
    pub fn new() -> Self {
        Self {
            mode: GizmoMode::Translate,
            snap: SnapSettings::default(),
            attached: None,
            drag_origin: None,
        }
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GizmoMode) {
        self.mode = mode;
    }

    pub fn attached(&self) -> Option<Uuid> {
        self.attached
    }

    /// Attach to a node, detaching from any previous one.
    pub fn attach(&mut self, node: Uuid) {
        self.attached = Some(node);
    }

    pub fn detach(&mut self) {
        self.attached = None;
        self.drag_origin = None;
    }

    pub fn visible(&self) -> bool {
        self.attached.is_some()
    }

    pub fn snap(&self) -> SnapSettings {
        self.snap
    }

    pub fn set_translation_snap(&mut self, step: f32) {
        self.snap.translation = Some(step);
    }

    pub fn set_rotation_snap(&mut self, step: f32) {
        self.snap.rotation = Some(step);
    }

    pub fn set_scale_snap(&mut self, step: f32) {
        self.snap.scale = Some(step);
    }

    /// Capture the transform the drag started from.
    pub fn begin_drag(&mut self, current: Transform) {
        self.drag_origin = Some(current);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Apply a drag delta in the active mode, honoring snap increments.
    pub fn apply_delta(&self, transform: &mut Transform, delta: Vec3) {
        match self.mode {
            GizmoMode::Translate => {
                transform.translation += delta;
                if let Some(step) = self.snap.translation {
                    transform.translation = snap_vec(transform.translation, step);
                }
            }
            GizmoMode::Rotate => {
                transform.rotation += delta;
                if let Some(step) = self.snap.rotation {
                    transform.rotation = snap_vec(transform.rotation, step);
                }
            }
            GizmoMode::Scale => {
                transform.scale += delta;
                if let Some(step) = self.snap.scale {
                    transform.scale = snap_vec(transform.scale, step);
                }
            }
        }
    }

    /// Finish the drag. True when the transform net-changed since
    /// `begin_drag`.
    pub fn end_drag(&mut self, current: &Transform) -> bool {
        match self.drag_origin.take() {
            Some(origin) => origin != *current,
            None => false,
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag_origin = None;
    }
}

fn snap_vec(v: Vec3, step: f32) -> Vec3 {
    if step <= 0.0 {
        return v;
    }
    (v / step).round() * step
}
