//! Pointer-based object selection.
//!
//! Tracks what the user clicked on. A pointer-down/up pair at the same
//! normalized coordinate is a click and resolves to the nearest visible
//! node under a camera ray; any displacement between down and up is a
//! drag (camera orbit, gizmo) and produces no selection change.

use glam::Vec2;
use uuid::Uuid;

use super::camera::Camera;
use crate::scene::{Aabb, SceneGraph};

/// Outcome of a completed click gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionChange {
    pub selected: Option<Uuid>,
}

/// Axis-aligned outline drawn around the selected node. The extent is
/// refreshed every frame while something is selected; it is not updated
/// on mutation.
#[derive(Debug, Clone, Copy)]
pub struct SelectionBox {
    pub visible: bool,
    pub bounds: Aabb,
}

pub struct ObjectSelector {
    pending_down: Option<Vec2>,
    highlighter: SelectionBox,
}

impl Default for ObjectSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectSelector {
    pub fn new() -> Self {
        Self {
            pending_down: None,
            highlighter: SelectionBox {
                visible: false,
                bounds: Aabb::point(glam::Vec3::ZERO),
            },
        }
    }

    pub fn highlighter(&self) -> &SelectionBox {
        &self.highlighter
    }

    pub fn set_highlight_bounds(&mut self, bounds: Aabb) {
        self.highlighter.bounds = bounds;
    }

    /// Begin a gesture at normalized surface coordinates ([0, 1] with y
    /// down). A fresh press implicitly cancels an unfinished gesture.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.pending_down = Some(Vec2::new(x, y));
    }

    /// Complete a gesture. Returns a selection change only for a click
    /// (zero displacement); drags return `None`.
    pub fn pointer_up(
        &mut self,
        x: f32,
        y: f32,
        graph: &SceneGraph,
        camera: &Camera,
    ) -> Option<SelectionChange> {
        let down = self.pending_down.take()?;
        let up = Vec2::new(x, y);
        if down.distance(up) != 0.0 {
            return None;
        }

        let ray = camera.ray_from_ndc(up.x * 2.0 - 1.0, -(up.y * 2.0) + 1.0);
        let selected = nearest_hit(graph, &ray);
        self.highlighter.visible = selected.is_some();
        Some(SelectionChange { selected })
    }

    /// Select a known node directly (outliner click, reload restore).
    pub fn connect(&mut self, node: Uuid) -> SelectionChange {
        self.highlighter.visible = true;
        SelectionChange {
            selected: Some(node),
        }
    }

    pub fn disconnect(&mut self) -> SelectionChange {
        self.highlighter.visible = false;
        SelectionChange { selected: None }
    }
}

/// Nearest ray hit over the visible tree at the time of the call.
fn nearest_hit(graph: &SceneGraph, ray: &super::camera::Ray) -> Option<Uuid> {
    let mut best: Option<(f32, Uuid)> = None;
    graph.visit_visible(&mut |node, world| {
        let Some(geometry) = &node.geometry else {
            return;
        };
        let bounds = geometry.bounds.transformed(world);
        if let Some(t) = ray.intersect_aabb(&bounds) {
            if best.map_or(true, |(nearest, _)| t < nearest) {
                best = Some((t, node.id));
            }
        }
    });
    best.map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{GeometryData, MaterialData, SceneNode, Transform};
    use glam::Vec3;

    fn camera_on_z() -> Camera {
        let mut camera = Camera::editor_default();
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        camera.look_at(Vec3::ZERO);
        camera
    }

    fn cube_at(graph: &mut SceneGraph, name: &str, at: Vec3) -> Uuid {
        let mut node = SceneNode::mesh(
            name,
            GeometryData::cuboid(1.0, 1.0, 1.0),
            MaterialData::white(),
        );
        node.transform = Transform::from_translation(at);
        graph.insert(node, None, None).unwrap()
    }

    #[test]
    fn click_selects_the_node_under_the_pointer() {
        let mut graph = SceneGraph::new();
        let cube = cube_at(&mut graph, "cube", Vec3::ZERO);
        let camera = camera_on_z();

        let mut selector = ObjectSelector::new();
        selector.pointer_down(0.5, 0.5);
        let change = selector.pointer_up(0.5, 0.5, &graph, &camera).unwrap();
        assert_eq!(change.selected, Some(cube));
        assert!(selector.highlighter().visible);
    }

    #[test]
    fn click_on_empty_space_selects_none() {
        let graph = SceneGraph::new();
        let camera = camera_on_z();

        let mut selector = ObjectSelector::new();
        selector.pointer_down(0.5, 0.5);
        let change = selector.pointer_up(0.5, 0.5, &graph, &camera).unwrap();
        assert_eq!(change.selected, None);
        assert!(!selector.highlighter().visible);
    }

    #[test]
    fn any_displacement_is_a_drag() {
        let mut graph = SceneGraph::new();
        cube_at(&mut graph, "cube", Vec3::ZERO);
        let camera = camera_on_z();

        for delta in [0.5, 0.01, 1e-4] {
            let mut selector = ObjectSelector::new();
            selector.pointer_down(0.5, 0.5);
            assert!(selector
                .pointer_up(0.5 + delta, 0.5, &graph, &camera)
                .is_none());
        }
    }

    #[test]
    fn nearest_of_two_overlapping_nodes_wins() {
        let mut graph = SceneGraph::new();
        let near = cube_at(&mut graph, "near", Vec3::new(0.0, 0.0, 3.0));
        let _far = cube_at(&mut graph, "far", Vec3::ZERO);
        let camera = camera_on_z();

        let mut selector = ObjectSelector::new();
        selector.pointer_down(0.5, 0.5);
        let change = selector.pointer_up(0.5, 0.5, &graph, &camera).unwrap();
        assert_eq!(change.selected, Some(near));
    }

    #[test]
    fn invisible_nodes_are_not_pickable() {
        let mut graph = SceneGraph::new();
        let id = cube_at(&mut graph, "cube", Vec3::ZERO);
        graph.get_mut(id).unwrap().visible = false;
        let camera = camera_on_z();

        let mut selector = ObjectSelector::new();
        selector.pointer_down(0.5, 0.5);
        let change = selector.pointer_up(0.5, 0.5, &graph, &camera).unwrap();
        assert_eq!(change.selected, None);
    }

    #[test]
    fn new_press_cancels_unfinished_gesture() {
        let mut graph = SceneGraph::new();
        let cube = cube_at(&mut graph, "cube", Vec3::ZERO);
        let camera = camera_on_z();

        let mut selector = ObjectSelector::new();
        selector.pointer_down(0.1, 0.1);
        // The first gesture never saw its release; a second press takes
        // over and completes as a clean click.
        selector.pointer_down(0.5, 0.5);
        let change = selector.pointer_up(0.5, 0.5, &graph, &camera).unwrap();
        assert_eq!(change.selected, Some(cube));

        // And the consumed gesture leaves nothing pending.
        assert!(selector.pointer_up(0.5, 0.5, &graph, &camera).is_none());
    }

    #[test]
    fn connect_and_disconnect_toggle_the_highlighter() {
        let mut selector = ObjectSelector::new();
        let id = Uuid::new_v4();
        let change = selector.connect(id);
        assert_eq!(change.selected, Some(id));
        assert!(selector.highlighter().visible);

        let change = selector.disconnect();
        assert_eq!(change.selected, None);
        assert!(!selector.highlighter().visible);
    }
}
