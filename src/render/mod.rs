pub mod camera;
pub mod gizmo;
pub mod overlay;
pub mod pick;
pub mod stats;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use glam::Vec3;
use uuid::Uuid;

use crate::events::{EventHub, EventKind, ViewportEvent};
use crate::scene::serialization::{
    strip_light_targets, ProjectSettings, SceneDocument, SerializedNode, SerializedScene,
};
use crate::scene::{
    GeometryData, LightParams, MaterialData, NodeKind, SceneError, SceneGraph, SceneNode,
    SceneStatistics,
};

use camera::{Camera, OrbitControls};
use gizmo::{GizmoMode, TransformGizmo};
use overlay::{GridOverlay, OverlayLayer, Theme};
use pick::{ObjectSelector, SelectionChange};
use stats::{FrameTiming, StatsThrottle};

/// Seam to the external 3D rendering library. The main pass clears the
/// frame; overlay passes must composite without clearing.
pub trait Renderer {
    fn set_clear_color(&mut self, rgb: [f32; 3], alpha: f32);
    fn render(&mut self, graph: &SceneGraph, camera: &Camera);
    fn render_overlay(&mut self, layer: &OverlayLayer<'_>, camera: &Camera);
}

/// No-op renderer for headless hosts and tests.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn set_clear_color(&mut self, _rgb: [f32; 3], _alpha: f32) {}
    fn render(&mut self, _graph: &SceneGraph, _camera: &Camera) {}
    fn render_overlay(&mut self, _layer: &OverlayLayer<'_>, _camera: &Camera) {}
}

/// Editing-aid options. A `None` or zero snap leaves the previous value
/// in place; there is intentionally no way to clear a snap once set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewportConfig {
    pub translation_snap: Option<f32>,
    pub rotation_snap: Option<f32>,
    pub scale_snap: Option<f32>,
}

/// Inbound messages from the host editor.
#[derive(Debug, Clone)]
pub enum HostMessage {
    DocumentUpdated { text: String },
    AddShape { kind: String },
    AddLight { kind: String },
    Configure(ViewportConfig),
    Focus,
    Blur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    Idle,
    /// Re-populating the whole tree from a document; per-node
    /// added/changed notifications are suppressed.
    BulkLoading,
}

const STATS_WINDOW: Duration = Duration::from_millis(100);

/// The live scene editor: owns the tree, camera, selection, overlays
/// and the per-frame loop, and emits change events for the host.
pub struct Viewport<R: Renderer> {
    renderer: R,
    theme: Theme,
    graph: SceneGraph,
    project: ProjectSettings,
    scripts: Vec<String>,
    camera: Rc<RefCell<Camera>>,
    cameras: HashMap<Uuid, Rc<RefCell<Camera>>>,
    controls: OrbitControls,
    selector: ObjectSelector,
    gizmo: TransformGizmo,
    grid: GridOverlay,
    geometries: HashMap<Uuid, GeometryData>,
    materials: HashMap<Uuid, MaterialData>,
    selected: Option<Uuid>,
    stats: SceneStatistics,
    last_frametime_ms: f32,
    events: EventHub,
    user_animations: Vec<Box<dyn FnMut(f32)>>,
    timing: FrameTiming,
    stats_throttle: StatsThrottle,
    focused: bool,
    frame_handle: u64,
    load_phase: LoadPhase,
}

impl<R: Renderer> Viewport<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_theme(renderer, Theme::Dark)
    }

    pub fn with_theme(mut renderer: R, theme: Theme) -> Self {
        log::info!("viewport color scheme: {:?}", theme);
        let (rgb, alpha) = theme.background();
        renderer.set_clear_color(rgb, alpha);

        let camera = Rc::new(RefCell::new(Camera::editor_default()));
        let mut cameras = HashMap::new();
        cameras.insert(camera.borrow().id, Rc::clone(&camera));

        Self {
            renderer,
            theme,
            graph: SceneGraph::new(),
            project: ProjectSettings::default(),
            scripts: Vec::new(),
            camera,
            cameras,
            controls: OrbitControls::new(),
            selector: ObjectSelector::new(),
            gizmo: TransformGizmo::new(),
            grid: GridOverlay::for_theme(theme),
            geometries: HashMap::new(),
            materials: HashMap::new(),
            selected: None,
            stats: SceneStatistics::default(),
            last_frametime_ms: 0.0,
            events: EventHub::new(),
            user_animations: Vec::new(),
            timing: FrameTiming::new(),
            stats_throttle: StatsThrottle::new(STATS_WINDOW),
            focused: true,
            frame_handle: 0,
            load_phase: LoadPhase::Idle,
        }
    }

    pub fn subscribe(&mut self, kind: EventKind) -> Receiver<ViewportEvent> {
        self.events.subscribe(kind)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn statistics(&self) -> SceneStatistics {
        self.stats
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn frame_handle(&self) -> u64 {
        self.frame_handle
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls.enabled
    }

    pub fn gizmo(&self) -> &TransformGizmo {
        &self.gizmo
    }

    /// Shared handle to the live camera. The same instance survives
    /// document reloads; only its field values and id change.
    pub fn camera(&self) -> Rc<RefCell<Camera>> {
        Rc::clone(&self.camera)
    }

    pub fn registered_camera(&self, id: Uuid) -> Option<Rc<RefCell<Camera>>> {
        self.cameras.get(&id).cloned()
    }

    pub fn geometry_resource(&self, id: Uuid) -> Option<&GeometryData> {
        self.geometries.get(&id)
    }

    pub fn material_resource(&self, id: Uuid) -> Option<&MaterialData> {
        self.materials.get(&id)
    }

    /// Dispatch an inbound host message. Document updates are routed
    /// through the sync coordinator instead.
    pub fn handle_message(&mut self, message: HostMessage) {
        match message {
            HostMessage::DocumentUpdated { .. } => {
                log::debug!("ignoring document update delivered without a sync coordinator");
            }
            HostMessage::AddShape { kind } => self.add_primitive(&kind),
            HostMessage::AddLight { kind } => self.add_light(&kind),
            HostMessage::Configure(config) => self.configure(config),
            HostMessage::Focus => self.focus(),
            HostMessage::Blur => self.blur(),
        }
    }

    // ------------------------------------------------------------------
    // tree mutation
    // ------------------------------------------------------------------

    /// Insert a node (appended to the root, or spliced into `parent` at
    /// `index`). Registers the node's geometry/material resources, and
    /// emits added/changed events unless a bulk reload is in progress.
    pub fn add_object(
        &mut self,
        node: SceneNode,
        parent: Option<Uuid>,
        index: Option<usize>,
        focus: bool,
    ) -> Result<Uuid, SceneError> {
        if let Some(geometry) = &node.geometry {
            self.geometries.insert(geometry.id, geometry.clone());
        }
        if let Some(material) = &node.material {
            self.materials.insert(material.id, material.clone());
        }

        let id = self.graph.insert(node, parent, index)?;

        if self.load_phase == LoadPhase::Idle {
            self.events.emit(ViewportEvent::ObjectAdded { node: id });
            self.events.emit(ViewportEvent::GraphChanged);
            self.refresh_stats();
        }

        if focus {
            let change = self.selector.connect(id);
            self.apply_selection_change(change);
        }
        Ok(id)
    }

    /// Remove the selected node (delete gesture). Emits `ObjectRemoved`
    /// then clears the selection.
    pub fn remove_selected(&mut self) {
        let Some(id) = self.selected else {
            return;
        };
        if self.graph.remove(id).is_some() {
            self.events.emit(ViewportEvent::ObjectRemoved { node: id });
            self.refresh_stats();
        }
        let change = self.selector.disconnect();
        self.apply_selection_change(change);
    }

    /// Add a default-parameterized primitive and select it. Meshes are
    /// placed with their base resting on the ground plane.
    pub fn add_primitive(&mut self, kind: &str) {
        let node = match kind {
            "cube" => {
                let mut node = SceneNode::mesh(
                    "Cube",
                    GeometryData::cuboid(1.0, 1.0, 1.0),
                    MaterialData::white(),
                );
                node.transform.translation = Vec3::new(0.0, 0.5, 0.0);
                node
            }
            "sphere" => {
                let mut node = SceneNode::mesh(
                    "Sphere",
                    GeometryData::sphere(0.5, 32, 32),
                    MaterialData::white(),
                );
                node.transform.translation = Vec3::new(0.0, 0.5, 0.0);
                node
            }
            "cone" => {
                let mut node = SceneNode::mesh(
                    "Cone",
                    GeometryData::cone(0.5, 1.0, 32),
                    MaterialData::white(),
                );
                node.transform.translation = Vec3::new(0.0, 0.5, 0.0);
                node
            }
            "plane" => {
                let mut node = SceneNode::mesh(
                    "Plane",
                    GeometryData::plane(1.0, 1.0),
                    MaterialData::white(),
                );
                node.transform.rotation.x = -std::f32::consts::FRAC_PI_2;
                node
            }
            _ => {
                log::warn!("unknown shape kind: {kind}");
                return;
            }
        };
        if let Err(err) = self.add_object(node, None, None, true) {
            log::warn!("failed to add {kind}: {err}");
        }
    }

    /// Add a light of the requested kind and select it. "sky" is a
    /// placeholder for a future environment light and adds nothing.
    pub fn add_light(&mut self, kind: &str) {
        let node = match kind {
            "directional" => {
                let mut node = SceneNode::light(
                    NodeKind::DirectionalLight,
                    "DirectionalLight",
                    LightParams::default(),
                );
                node.transform.translation = Vec3::new(5.0, 10.0, 7.5);
                node
            }
            "point" => {
                let params = LightParams {
                    color: [0.133, 0.133, 0.133],
                    ..LightParams::default()
                };
                SceneNode::light(NodeKind::PointLight, "PointLight", params)
            }
            "spot" => {
                let params = LightParams {
                    angle: std::f32::consts::PI * 0.1,
                    ..LightParams::default()
                };
                let mut node = SceneNode::light(NodeKind::SpotLight, "SpotLight", params);
                node.transform.translation = Vec3::new(5.0, 10.0, 7.5);
                node
            }
            _ => {
                log::warn!("unknown light kind: {kind}");
                return;
            }
        };
        if let Err(err) = self.add_object(node, None, None, true) {
            log::warn!("failed to add {kind} light: {err}");
        }
    }

    /// Reset the tree to a single cube and directional light.
    pub fn scaffold(&mut self) {
        self.graph.clear();

        let mut cube = SceneNode::mesh(
            "Cube",
            GeometryData::cuboid(1.0, 1.0, 1.0),
            MaterialData::white(),
        );
        cube.transform.translation = Vec3::new(0.0, 0.5, 0.0);
        let cube_id = cube.id;

        let mut light = SceneNode::light(
            NodeKind::DirectionalLight,
            "DirectionalLight",
            LightParams::default(),
        );
        light.transform.translation = Vec3::new(-10.0, 15.0, 50.0);

        if let Err(err) = self
            .graph
            .insert(cube, None, None)
            .and_then(|_| self.graph.insert(light, None, None))
        {
            log::warn!("scaffold failed: {err}");
            return;
        }

        self.events.emit(ViewportEvent::ObjectAdded { node: cube_id });
        self.refresh_stats();
    }

    // ------------------------------------------------------------------
    // selection and input
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.selector.pointer_down(x, y);
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        let camera = self.camera.borrow().clone();
        if let Some(change) = self.selector.pointer_up(x, y, &self.graph, &camera) {
            self.apply_selection_change(change);
        }
    }

    /// Select a known node directly (outliner row click).
    pub fn select_node(&mut self, id: Uuid) {
        if !self.graph.contains(id) {
            log::warn!("cannot select unknown node {id}");
            return;
        }
        let change = self.selector.connect(id);
        self.apply_selection_change(change);
    }

    pub fn clear_selection(&mut self) {
        let change = self.selector.disconnect();
        self.apply_selection_change(change);
    }

    /// Key input from the render surface. Only honored while focused.
    pub fn handle_key(&mut self, key: &str) {
        if !self.focused {
            log::debug!("dropping key {key:?} while blurred");
            return;
        }
        match key {
            "w" => self.gizmo.set_mode(GizmoMode::Translate),
            "e" => self.gizmo.set_mode(GizmoMode::Rotate),
            "r" => self.gizmo.set_mode(GizmoMode::Scale),
            "Delete" => self.remove_selected(),
            "Escape" => self.clear_selection(),
            _ => {}
        }
    }

    fn apply_selection_change(&mut self, change: SelectionChange) {
        self.selected = change.selected;
        match change.selected {
            Some(id) => self.gizmo.attach(id),
            None => self.gizmo.detach(),
        }
        self.refresh_selection_highlight();
        self.events.emit(ViewportEvent::SelectionChanged {
            node: change.selected,
        });
    }

    // ------------------------------------------------------------------
    // gizmo drags
    // ------------------------------------------------------------------

    /// Start dragging the attached node. Orbit controls are disabled for
    /// the duration of the drag.
    pub fn begin_gizmo_drag(&mut self) -> bool {
        let Some(id) = self.gizmo.attached() else {
            return false;
        };
        let Some(transform) = self.graph.get(id).map(|node| node.transform) else {
            return false;
        };
        self.controls.enabled = false;
        self.gizmo.begin_drag(transform);
        true
    }

    pub fn update_gizmo_drag(&mut self, delta: Vec3) {
        if !self.gizmo.is_dragging() {
            return;
        }
        let Some(id) = self.gizmo.attached() else {
            return;
        };
        if let Some(node) = self.graph.get_mut(id) {
            self.gizmo.apply_delta(&mut node.transform, delta);
        }
    }

    /// Finish the drag; emits `GraphChanged` only when the transform
    /// actually differs from the value captured at drag start.
    pub fn end_gizmo_drag(&mut self) {
        self.controls.enabled = true;
        let current = self
            .gizmo
            .attached()
            .and_then(|id| self.graph.get(id))
            .map(|node| node.transform);
        let changed = match current {
            Some(transform) => self.gizmo.end_drag(&transform),
            None => {
                self.gizmo.cancel_drag();
                false
            }
        };
        if changed {
            self.events.emit(ViewportEvent::GraphChanged);
        }
    }

    pub fn configure(&mut self, config: ViewportConfig) {
        if let Some(step) = config.translation_snap {
            if step != 0.0 {
                self.gizmo.set_translation_snap(step);
            }
        }
        if let Some(step) = config.rotation_snap {
            if step != 0.0 {
                self.gizmo.set_rotation_snap(step);
            }
        }
        if let Some(step) = config.scale_snap {
            if step != 0.0 {
                self.gizmo.set_scale_snap(step);
            }
        }
    }

    // ------------------------------------------------------------------
    // camera
    // ------------------------------------------------------------------

    pub fn orbit_camera(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let mut camera = self.camera.borrow_mut();
        self.controls.orbit(&mut camera, yaw_delta, pitch_delta);
    }

    pub fn dolly_camera(&mut self, amount: f32) {
        let mut camera = self.camera.borrow_mut();
        self.controls.dolly(&mut camera, amount);
    }

    /// Keep the camera aspect in step with the render surface.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.camera.borrow_mut().aspect = width / height;
    }

    // ------------------------------------------------------------------
    // frame loop
    // ------------------------------------------------------------------

    /// Enter the focused state and (re)start the frame loop. Focusing
    /// while already focused restarts the handle without starting a
    /// second loop.
    pub fn focus(&mut self) {
        self.frame_handle = self.frame_handle.wrapping_add(1);
        self.focused = true;
    }

    /// Cancel the frame loop. The tree can still be mutated and a
    /// one-shot render requested while blurred.
    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// One frame: run animation callbacks, render, composite overlays,
    /// and flush any held statistics. No-op while blurred.
    pub fn tick(&mut self, now: Instant) {
        if !self.focused {
            return;
        }
        self.timing.update(now);
        self.refresh_selection_highlight();
        let dt = self.timing.frame_dt;
        for callback in &mut self.user_animations {
            callback(dt);
        }
        self.render_frame(now);
        if let Some((stats, frametime_ms)) = self.stats_throttle.poll(now) {
            self.events
                .emit(ViewportEvent::StatsChanged { stats, frametime_ms });
        }
    }

    /// Render a single frame regardless of focus state.
    pub fn render_once(&mut self, now: Instant) {
        self.refresh_selection_highlight();
        self.render_frame(now);
    }

    /// Register a per-frame callback. Callbacks are dropped by a
    /// document reload.
    pub fn add_frame_callback(&mut self, callback: Box<dyn FnMut(f32)>) {
        self.user_animations.push(callback);
    }

    fn render_frame(&mut self, now: Instant) {
        let camera = self.camera.borrow().clone();
        let start = Instant::now();
        self.renderer.render(&self.graph, &camera);
        let frametime_ms = start.elapsed().as_secs_f32() * 1000.0;
        self.last_frametime_ms = frametime_ms;

        self.renderer
            .render_overlay(&OverlayLayer::Grid(&self.grid), &camera);
        self.renderer.render_overlay(
            &OverlayLayer::SelectionBox(self.selector.highlighter()),
            &camera,
        );
        self.renderer
            .render_overlay(&OverlayLayer::Gizmo(&self.gizmo), &camera);

        if let Some((stats, frametime_ms)) =
            self.stats_throttle.offer(self.stats, frametime_ms, now)
        {
            self.events
                .emit(ViewportEvent::StatsChanged { stats, frametime_ms });
        }
    }

    fn refresh_selection_highlight(&mut self) {
        if let Some(id) = self.selected {
            if let Some(bounds) = self.graph.subtree_world_bounds(id) {
                self.selector.set_highlight_bounds(bounds);
            }
        }
    }

    fn refresh_stats(&mut self) {
        self.stats = self.graph.statistics();
        let now = Instant::now();
        if let Some((stats, frametime_ms)) =
            self.stats_throttle
                .offer(self.stats, self.last_frametime_ms, now)
        {
            self.events
                .emit(ViewportEvent::StatsChanged { stats, frametime_ms });
        }
    }

    // ------------------------------------------------------------------
    // document bridge
    // ------------------------------------------------------------------

    /// Snapshot the live state as a persisted document, with the light
    /// target correction applied.
    pub fn to_document(&self) -> SceneDocument {
        let mut doc = SceneDocument {
            project: self.project,
            camera: self.camera.borrow().to_serialized(),
            scene: SerializedScene {
                id: self.graph.id,
                name: self.graph.name.clone(),
                background: self.graph.background,
                environment: self.graph.environment.clone(),
                fog: self.graph.fog,
                background_blurriness: self.graph.background_blurriness,
                background_intensity: self.graph.background_intensity,
                user_data: self.graph.user_data.clone(),
                children: self
                    .graph
                    .roots()
                    .iter()
                    .filter_map(|&id| SerializedNode::from_graph(&self.graph, id))
                    .collect(),
            },
            scripts: self.scripts.clone(),
        };
        strip_light_targets(&mut doc);
        doc
    }

    /// Replace the live state with the document's. The camera instance
    /// is reused with the incoming identity; node added/changed events
    /// are suppressed so the reload emits a single trailing
    /// `GraphChanged`. A still-present selection is re-established by
    /// id, otherwise cleared.
    pub fn from_document(&mut self, doc: &SceneDocument) {
        self.graph.clear();
        self.user_animations.clear();

        let old_id = self.camera.borrow().id;
        self.camera.borrow_mut().apply_serialized(&doc.camera);
        self.cameras.remove(&old_id);
        self.cameras.insert(doc.camera.id, Rc::clone(&self.camera));
        self.events.emit(ViewportEvent::CameraReset {
            camera: doc.camera.id,
        });

        self.project = doc.project;
        self.scripts = doc.scripts.clone();

        self.graph.id = doc.scene.id;
        self.graph.name = doc.scene.name.clone();
        self.graph.background = doc.scene.background;
        self.graph.environment = doc.scene.environment.clone();
        self.graph.fog = doc.scene.fog;
        self.graph.background_blurriness = doc.scene.background_blurriness;
        self.graph.background_intensity = doc.scene.background_intensity;
        self.graph.user_data = doc.scene.user_data.clone();

        self.load_phase = LoadPhase::BulkLoading;
        for child in &doc.scene.children {
            self.add_serialized_subtree(child, None);
        }
        self.load_phase = LoadPhase::Idle;

        match self.selected {
            Some(prev) if self.graph.contains(prev) => {
                let change = self.selector.connect(prev);
                self.apply_selection_change(change);
            }
            Some(_) => {
                let change = self.selector.disconnect();
                self.apply_selection_change(change);
            }
            None => {}
        }

        self.refresh_stats();
        self.events.emit(ViewportEvent::GraphChanged);
    }

    fn add_serialized_subtree(&mut self, serialized: &SerializedNode, parent: Option<Uuid>) {
        let node = serialized.to_node();
        let id = node.id;
        if let Err(err) = self.add_object(node, parent, None, false) {
            log::warn!("dropping node {} from reload: {err}", serialized.id);
            return;
        }
        for child in &serialized.children {
            self.add_serialized_subtree(child, Some(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::fingerprint::ContentFingerprint;
    use std::cell::Cell;

    fn drain(rx: &Receiver<ViewportEvent>) -> Vec<ViewportEvent> {
        rx.try_iter().collect()
    }

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Cell<usize>,
        overlay_draws: Cell<usize>,
        clear_color: Cell<Option<([f32; 3], f32)>>,
    }

    impl Renderer for RecordingRenderer {
        fn set_clear_color(&mut self, rgb: [f32; 3], alpha: f32) {
            self.clear_color.set(Some((rgb, alpha)));
        }
        fn render(&mut self, _graph: &SceneGraph, _camera: &Camera) {
            self.frames.set(self.frames.get() + 1);
        }
        fn render_overlay(&mut self, _layer: &OverlayLayer<'_>, _camera: &Camera) {
            self.overlay_draws.set(self.overlay_draws.get() + 1);
        }
    }

    #[test]
    fn scaffold_populates_cube_and_light() {
        let mut viewport = Viewport::new(NullRenderer);
        let added = viewport.subscribe(EventKind::ObjectAdded);
        let stats_rx = viewport.subscribe(EventKind::StatsChanged);

        viewport.scaffold();

        let stats = viewport.statistics();
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.triangles, 12);

        let events = drain(&added);
        assert_eq!(events.len(), 1);
        let ViewportEvent::ObjectAdded { node } = events[0] else {
            panic!("expected ObjectAdded");
        };
        assert_eq!(viewport.graph().get(node).unwrap().kind, NodeKind::Mesh);

        let stats_events = drain(&stats_rx);
        assert_eq!(stats_events.len(), 1);
        let ViewportEvent::StatsChanged { stats, .. } = stats_events[0] else {
            panic!("expected StatsChanged");
        };
        assert_eq!(stats.objects, 2);
    }

    #[test]
    fn unknown_shape_kind_is_a_safe_noop() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.scaffold();
        let added = viewport.subscribe(EventKind::ObjectAdded);
        let before = viewport.statistics();

        viewport.add_primitive("torus");

        assert_eq!(viewport.statistics(), before);
        assert!(drain(&added).is_empty());
    }

    #[test]
    fn sky_light_is_a_noop_placeholder() {
        let mut viewport = Viewport::new(NullRenderer);
        let added = viewport.subscribe(EventKind::ObjectAdded);

        viewport.add_light("sky");

        assert!(viewport.graph().is_empty());
        assert!(drain(&added).is_empty());
    }

    #[test]
    fn add_primitive_selects_and_notifies() {
        let mut viewport = Viewport::new(NullRenderer);
        let added = viewport.subscribe(EventKind::ObjectAdded);
        let changed = viewport.subscribe(EventKind::GraphChanged);
        let selection = viewport.subscribe(EventKind::SelectionChanged);

        viewport.add_primitive("cube");

        assert_eq!(drain(&added).len(), 1);
        assert_eq!(drain(&changed).len(), 1);
        let selections = drain(&selection);
        assert_eq!(selections.len(), 1);
        assert_eq!(viewport.selected(), viewport.gizmo().attached());
        assert!(viewport.selected().is_some());

        // the new node's resources land in the registries
        let id = viewport.selected().unwrap();
        let node = viewport.graph().get(id).unwrap();
        let geometry_id = node.geometry.as_ref().unwrap().id;
        let material_id = node.material.as_ref().unwrap().id;
        assert!(viewport.geometry_resource(geometry_id).is_some());
        assert!(viewport.material_resource(material_id).is_some());
    }

    #[test]
    fn orbit_is_locked_out_while_dragging_the_gizmo() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.add_primitive("cube");

        let before = viewport.camera().borrow().position;
        viewport.begin_gizmo_drag();
        viewport.orbit_camera(0.5, 0.1);
        viewport.dolly_camera(1.0);
        assert_eq!(viewport.camera().borrow().position, before);
        viewport.end_gizmo_drag();

        viewport.orbit_camera(0.5, 0.1);
        assert_ne!(viewport.camera().borrow().position, before);
    }

    #[test]
    fn delete_key_removes_selection_without_graph_change() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.add_primitive("cube");
        let removed = viewport.subscribe(EventKind::ObjectRemoved);
        let changed = viewport.subscribe(EventKind::GraphChanged);
        let selection = viewport.subscribe(EventKind::SelectionChanged);

        viewport.handle_key("Delete");

        assert!(viewport.graph().is_empty());
        assert_eq!(viewport.selected(), None);
        assert_eq!(drain(&removed).len(), 1);
        assert!(drain(&changed).is_empty());
        assert_eq!(
            drain(&selection),
            vec![ViewportEvent::SelectionChanged { node: None }]
        );
    }

    #[test]
    fn keys_are_dropped_while_blurred() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.add_primitive("cube");
        viewport.blur();

        viewport.handle_key("Delete");
        assert!(!viewport.graph().is_empty());

        viewport.focus();
        viewport.handle_key("Delete");
        assert!(viewport.graph().is_empty());
    }

    #[test]
    fn mode_keys_switch_the_gizmo() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.handle_key("e");
        assert_eq!(viewport.gizmo().mode(), GizmoMode::Rotate);
        viewport.handle_key("r");
        assert_eq!(viewport.gizmo().mode(), GizmoMode::Scale);
        viewport.handle_key("w");
        assert_eq!(viewport.gizmo().mode(), GizmoMode::Translate);
    }

    #[test]
    fn escape_clears_the_selection() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.add_primitive("cube");
        assert!(viewport.selected().is_some());

        viewport.handle_key("Escape");
        assert_eq!(viewport.selected(), None);
        assert!(!viewport.gizmo().visible());
    }

    #[test]
    fn bulk_reload_emits_one_graph_change_and_no_adds() {
        let mut author = Viewport::new(NullRenderer);
        author.add_primitive("cube");
        author.add_primitive("sphere");
        author.add_light("directional");
        let doc = author.to_document();

        let mut viewport = Viewport::new(NullRenderer);
        let changed = viewport.subscribe(EventKind::GraphChanged);
        let added = viewport.subscribe(EventKind::ObjectAdded);

        viewport.from_document(&doc);

        assert_eq!(viewport.graph().len(), 3);
        assert_eq!(drain(&changed).len(), 1);
        assert!(drain(&added).is_empty());
    }

    #[test]
    fn camera_instance_survives_reloads_with_new_identity() {
        let author = Viewport::new(NullRenderer);
        let doc1 = author.to_document();
        let mut author2 = Viewport::new(NullRenderer);
        author2.add_primitive("cube");
        let doc2 = author2.to_document();
        assert_ne!(doc1.camera.id, doc2.camera.id);

        let mut viewport = Viewport::new(NullRenderer);
        let handle = viewport.camera();
        let original_id = handle.borrow().id;

        viewport.from_document(&doc1);
        viewport.from_document(&doc2);

        assert!(Rc::ptr_eq(&handle, &viewport.camera()));
        assert_eq!(handle.borrow().id, doc2.camera.id);
        assert!(viewport.registered_camera(doc2.camera.id).is_some());
        assert!(viewport.registered_camera(doc1.camera.id).is_none());
        assert!(viewport.registered_camera(original_id).is_none());
    }

    #[test]
    fn reload_restores_selection_by_id() {
        let mut author = Viewport::new(NullRenderer);
        author.add_primitive("cube");
        let selected = author.selected().unwrap();
        let doc = author.to_document();

        // same viewport reloads its own document: ids persist
        author.from_document(&doc);
        assert_eq!(author.selected(), Some(selected));
        assert!(author.gizmo().visible());
    }

    #[test]
    fn reload_clears_selection_when_node_is_gone() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.add_primitive("cube");
        assert!(viewport.selected().is_some());
        let selection = viewport.subscribe(EventKind::SelectionChanged);

        let empty = Viewport::new(NullRenderer).to_document();
        viewport.from_document(&empty);

        assert_eq!(viewport.selected(), None);
        assert_eq!(
            drain(&selection),
            vec![ViewportEvent::SelectionChanged { node: None }]
        );
    }

    #[test]
    fn noop_drag_emits_no_graph_change() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.add_primitive("cube");
        let changed = viewport.subscribe(EventKind::GraphChanged);

        assert!(viewport.begin_gizmo_drag());
        assert!(!viewport.controls_enabled());
        viewport.end_gizmo_drag();

        assert!(viewport.controls_enabled());
        assert!(drain(&changed).is_empty());
    }

    #[test]
    fn real_drag_emits_one_graph_change() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.add_primitive("cube");
        let changed = viewport.subscribe(EventKind::GraphChanged);

        viewport.begin_gizmo_drag();
        viewport.update_gizmo_drag(Vec3::new(1.0, 0.0, 0.0));
        viewport.end_gizmo_drag();

        assert_eq!(drain(&changed).len(), 1);
        let id = viewport.selected().unwrap();
        assert_eq!(
            viewport.graph().get(id).unwrap().transform.translation,
            Vec3::new(1.0, 0.5, 0.0)
        );
    }

    #[test]
    fn configure_ignores_falsy_snap_values() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.configure(ViewportConfig {
            translation_snap: Some(0.5),
            ..ViewportConfig::default()
        });
        assert_eq!(viewport.gizmo().snap().translation, Some(0.5));

        viewport.configure(ViewportConfig {
            translation_snap: Some(0.0),
            ..ViewportConfig::default()
        });
        viewport.configure(ViewportConfig::default());
        assert_eq!(viewport.gizmo().snap().translation, Some(0.5));
    }

    #[test]
    fn tick_renders_only_while_focused() {
        let mut viewport = Viewport::new(RecordingRenderer::default());
        let now = Instant::now();
        viewport.tick(now);
        assert_eq!(viewport.renderer.frames.get(), 1);
        // grid, selection box, gizmo
        assert_eq!(viewport.renderer.overlay_draws.get(), 3);

        viewport.blur();
        viewport.tick(now + Duration::from_millis(16));
        assert_eq!(viewport.renderer.frames.get(), 1);

        // one-shot render still works while blurred
        viewport.render_once(now + Duration::from_millis(32));
        assert_eq!(viewport.renderer.frames.get(), 2);
    }

    #[test]
    fn refocus_restarts_the_frame_handle() {
        let mut viewport = Viewport::new(NullRenderer);
        let first = viewport.frame_handle();
        viewport.focus();
        viewport.focus();
        assert!(viewport.is_focused());
        assert_eq!(viewport.frame_handle(), first + 2);
    }

    #[test]
    fn reload_drops_user_frame_callbacks() {
        let mut viewport = Viewport::new(NullRenderer);
        let count = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&count);
        viewport.add_frame_callback(Box::new(move |_| seen.set(seen.get() + 1)));

        let now = Instant::now();
        viewport.tick(now);
        assert_eq!(count.get(), 1);

        let doc = viewport.to_document();
        viewport.from_document(&doc);
        viewport.tick(now + Duration::from_millis(16));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn theme_sets_the_clear_color() {
        let viewport = Viewport::with_theme(RecordingRenderer::default(), Theme::Light);
        let (_, alpha) = viewport.renderer.clear_color.get().unwrap();
        assert_eq!(alpha, 1.0);
        assert_eq!(viewport.theme(), Theme::Light);
    }

    #[test]
    fn click_selection_flows_through_the_viewport() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.add_primitive("cube");
        viewport.clear_selection();
        {
            let handle = viewport.camera();
            let mut camera = handle.borrow_mut();
            camera.position = Vec3::new(0.0, 0.5, 10.0);
            camera.look_at(Vec3::new(0.0, 0.5, 0.0));
        }
        let selection = viewport.subscribe(EventKind::SelectionChanged);

        viewport.pointer_down(0.5, 0.5);
        viewport.pointer_up(0.5, 0.5);
        let events = drain(&selection);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ViewportEvent::SelectionChanged { node: Some(_) }
        ));

        // a drag changes nothing
        viewport.pointer_down(0.2, 0.2);
        viewport.pointer_up(0.6, 0.2);
        assert!(drain(&selection).is_empty());
    }

    #[test]
    fn viewport_size_updates_camera_aspect() {
        let mut viewport = Viewport::new(NullRenderer);
        viewport.set_viewport_size(1600.0, 800.0);
        assert_eq!(viewport.camera().borrow().aspect, 2.0);
        viewport.set_viewport_size(1600.0, 0.0);
        assert_eq!(viewport.camera().borrow().aspect, 2.0);
    }

    #[test]
    fn document_round_trip_is_fingerprint_stable() {
        let mut author = Viewport::new(NullRenderer);
        author.add_primitive("cube");
        author.add_light("spot");
        // a live aim target is the known serializer defect; it must not
        // survive into the document
        let spot = author.selected().unwrap();
        let cube = author.graph().roots()[0];
        author.graph.get_mut(spot).unwrap().target = Some(cube);
        let doc = author.to_document();
        assert!(doc.scene.children.iter().all(|n| n.target.is_none()));

        let mut viewport = Viewport::new(NullRenderer);
        viewport.from_document(&doc);
        let round_tripped = viewport.to_document();

        assert_eq!(
            ContentFingerprint::of_document(&doc).unwrap(),
            ContentFingerprint::of_document(&round_tripped).unwrap()
        );
    }
}
