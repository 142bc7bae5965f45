//! Persisted document shapes and conversions to/from the live tree.
//!
//! The document is plain JSON: `{ project, camera, scene, scripts }`.
//! The camera is serialized separately from the scene tree so reloads
//! can adopt it onto the existing live camera (see the viewport's
//! `from_document`).

use glam::{Quat, Vec3};
use serde_json::Value;
use uuid::Uuid;

use super::{FogSettings, GeometryData, LightParams, MaterialData, NodeKind, SceneGraph, SceneNode, Transform};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Project-wide flags carried through the document.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectSettings {
    pub shadows: bool,
    pub vr: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            shadows: true,
            vr: false,
        }
    }
}

/// Persisted camera. Identity (`id`) is adopted wholesale on reload;
/// the live camera object itself is reused.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SerializedCamera {
    pub id: Uuid,
    pub name: String,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for SerializedCamera {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Camera".to_string(),
            fov: 50.0,
            aspect: 1.0,
            near: 0.01,
            far: 1000.0,
            position: Vec3::new(5.0, 5.0, 10.0),
            rotation: Quat::IDENTITY,
        }
    }
}

/// One node of the persisted tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SerializedNode {
    pub id: Uuid,
    pub kind: NodeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub render_order: i32,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub user_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializedNode>,
}

fn default_true() -> bool {
    true
}

fn default_intensity() -> f32 {
    1.0
}

impl SerializedNode {
    /// Snapshot of a single live node, children not included.
    pub fn from_node(node: &SceneNode) -> Self {
        Self {
            id: node.id,
            kind: node.kind,
            name: node.name.clone(),
            transform: node.transform,
            visible: node.visible,
            render_order: node.render_order,
            user_data: node.user_data.clone(),
            geometry: node.geometry.clone(),
            material: node.material.clone(),
            light: node.light,
            target: node.target,
            children: Vec::new(),
        }
    }

    /// Snapshot of a live subtree rooted at `id`.
    pub fn from_graph(graph: &SceneGraph, id: Uuid) -> Option<Self> {
        let node = graph.get(id)?;
        let mut out = Self::from_node(node);
        out.children = node
            .children
            .iter()
            .filter_map(|&child| Self::from_graph(graph, child))
            .collect();
        Some(out)
    }

    /// Rebuild a live node. Parent/child links are re-established by the
    /// caller inserting each node into the tree.
    pub fn to_node(&self) -> SceneNode {
        SceneNode {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            transform: self.transform,
            visible: self.visible,
            render_order: self.render_order,
            user_data: self.user_data.clone(),
            geometry: self.geometry.clone(),
            material: self.material.clone(),
            light: self.light,
            target: self.target,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Persisted scene: scene-level display settings plus the node tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SerializedScene {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fog: Option<FogSettings>,
    #[serde(default)]
    pub background_blurriness: f32,
    #[serde(default = "default_intensity")]
    pub background_intensity: f32,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub user_data: Value,
    #[serde(default)]
    pub children: Vec<SerializedNode>,
}

impl Default for SerializedScene {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            background: None,
            environment: None,
            fog: None,
            background_blurriness: 0.0,
            background_intensity: 1.0,
            user_data: Value::Null,
            children: Vec::new(),
        }
    }
}

/// The whole persisted document.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub project: ProjectSettings,
    #[serde(default)]
    pub camera: SerializedCamera,
    #[serde(default)]
    pub scene: SerializedScene,
    #[serde(default)]
    pub scripts: Vec<String>,
}

impl SceneDocument {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty-printed document text, the form written back to the host.
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Drop `target` references from serialized directional and spot
/// lights. Keeping them produces a self-referential structure the
/// deserializer cannot round-trip; the live lights are unaffected.
pub fn strip_light_targets(doc: &mut SceneDocument) {
    for child in &mut doc.scene.children {
        strip_node_targets(child);
    }
}

fn strip_node_targets(node: &mut SerializedNode) {
    if matches!(node.kind, NodeKind::DirectionalLight | NodeKind::SpotLight) {
        node.target = None;
    }
    for child in &mut node.children {
        strip_node_targets(child);
    }
}
