pub mod fingerprint;
pub mod serialization;

use std::collections::HashMap;

use glam::{EulerRot, Mat4, Quat, Vec3};
use uuid::Uuid;

/// Local TRS transform. Rotation is XYZ Euler, radians.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_euler(
                EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            ),
            self.translation,
        )
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn point(at: Vec3) -> Self {
        Self { min: at, max: at }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// World-space box enclosing this box under the given transform.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        let mut min = matrix.transform_point3(corners[0]);
        let mut max = min;
        for corner in &corners[1..] {
            let p = matrix.transform_point3(*corner);
            min = min.min(p);
            max = max.max(p);
        }
        Aabb { min, max }
    }
}

/// Parametric geometry attached to a mesh node. Carries the derived
/// buffer sizes used for statistics and the local bounds used for
/// picking; actual tessellation is the renderer's concern.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Box { width: f32, height: f32, depth: f32 },
    Sphere { radius: f32, width_segments: u32, height_segments: u32 },
    Cone { radius: f32, height: f32, radial_segments: u32 },
    Plane { width: f32, height: f32 },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeometryData {
    pub id: Uuid,
    pub kind: GeometryKind,
    pub vertex_count: u32,
    pub index_count: Option<u32>,
    pub bounds: Aabb,
}

impl GeometryData {
    /// Box with 4 vertices per face, indexed.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;
        Self {
            id: Uuid::new_v4(),
            kind: GeometryKind::Box { width, height, depth },
            vertex_count: 24,
            index_count: Some(36),
            bounds: Aabb::new(-half, half),
        }
    }

    /// UV sphere: a (ws+1)x(hs+1) vertex grid, two triangles per interior
    /// quad and one per pole column.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let triangles = 2 * ws * hs - 2 * ws;
        Self {
            id: Uuid::new_v4(),
            kind: GeometryKind::Sphere {
                radius,
                width_segments: ws,
                height_segments: hs,
            },
            vertex_count: (ws + 1) * (hs + 1),
            index_count: Some(triangles * 3),
            bounds: Aabb::new(Vec3::splat(-radius), Vec3::splat(radius)),
        }
    }

    /// Open cone with a bottom cap, apex up.
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        let rs = radial_segments.max(3);
        Self {
            id: Uuid::new_v4(),
            kind: GeometryKind::Cone {
                radius,
                height,
                radial_segments: rs,
            },
            // side ring + apex ring + cap ring + cap center
            vertex_count: (rs + 1) * 2 + rs + 1,
            // rs side triangles + rs cap triangles
            index_count: Some(rs * 6),
            bounds: Aabb::new(
                Vec3::new(-radius, -height * 0.5, -radius),
                Vec3::new(radius, height * 0.5, radius),
            ),
        }
    }

    /// Single quad in the XY plane.
    pub fn plane(width: f32, height: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: GeometryKind::Plane { width, height },
            vertex_count: 4,
            index_count: Some(6),
            bounds: Aabb::new(
                Vec3::new(-width * 0.5, -height * 0.5, 0.0),
                Vec3::new(width * 0.5, height * 0.5, 0.0),
            ),
        }
    }

    pub fn triangle_count(&self) -> u32 {
        match self.index_count {
            Some(indices) => indices / 3,
            None => self.vertex_count / 3,
        }
    }
}

/// Surface material attached to a mesh node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaterialData {
    pub id: Uuid,
    pub color: [f32; 3],
}

impl MaterialData {
    pub fn colored(color: [f32; 3]) -> Self {
        Self {
            id: Uuid::new_v4(),
            color,
        }
    }

    pub fn white() -> Self {
        Self::colored([1.0, 1.0, 1.0])
    }
}

/// Light parameters shared across light node kinds; fields that do not
/// apply to a kind are left at their defaults.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LightParams {
    pub color: [f32; 3],
    pub intensity: f32,
    pub distance: f32,
    pub angle: f32,
    pub penumbra: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            distance: 0.0,
            angle: 0.0,
            penumbra: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Mesh,
    Group,
    DirectionalLight,
    PointLight,
    SpotLight,
}

impl NodeKind {
    pub fn is_light(&self) -> bool {
        matches!(
            self,
            NodeKind::DirectionalLight | NodeKind::PointLight | NodeKind::SpotLight
        )
    }
}

/// A node in the live scene tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: Uuid,
    pub kind: NodeKind,
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub render_order: i32,
    pub user_data: serde_json::Value,
    pub geometry: Option<GeometryData>,
    pub material: Option<MaterialData>,
    pub light: Option<LightParams>,
    /// Aim target for directional/spot lights. Stripped from the
    /// persisted form (see `serialization::strip_light_targets`).
    pub target: Option<Uuid>,
    pub parent: Option<Uuid>,
    pub children: Vec<Uuid>,
}

impl SceneNode {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            transform: Transform::default(),
            visible: true,
            render_order: 0,
            user_data: serde_json::Value::Null,
            geometry: None,
            material: None,
            light: None,
            target: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, geometry: GeometryData, material: MaterialData) -> Self {
        let mut node = Self::new(NodeKind::Mesh, name);
        node.geometry = Some(geometry);
        node.material = Some(material);
        node
    }

    pub fn light(kind: NodeKind, name: impl Into<String>, params: LightParams) -> Self {
        debug_assert!(kind.is_light());
        let mut node = Self::new(kind, name);
        node.light = Some(params);
        node
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("parent node {0} is not in the scene")]
    UnknownParent(Uuid),
    #[error("node {0} is already in the scene")]
    DuplicateNode(Uuid),
}

/// Aggregate counts over the visible tree. Recomputed on structural
/// changes, not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStatistics {
    pub objects: u32,
    pub vertices: u32,
    pub triangles: u32,
}

/// Settings for distance fog, carried through the document verbatim.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FogSettings {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

/// The live scene tree: an arena of nodes keyed by id, with an ordered
/// list of root children. Nodes are created fresh on insert and only
/// attach below an existing parent, so the tree cannot form cycles.
pub struct SceneGraph {
    pub id: Uuid,
    pub name: String,
    pub background: Option<[f32; 4]>,
    pub environment: Option<String>,
    pub fog: Option<FogSettings>,
    pub background_blurriness: f32,
    pub background_intensity: f32,
    pub user_data: serde_json::Value,
    nodes: HashMap<Uuid, SceneNode>,
    roots: Vec<Uuid>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            background: None,
            environment: None,
            fog: None,
            background_blurriness: 0.0,
            background_intensity: 1.0,
            user_data: serde_json::Value::Null,
            nodes: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Drop every node. Scene-level settings are left as-is; a document
    /// reload overwrites them right after clearing.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[Uuid] {
        &self.roots
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    /// Insert a node under `parent` (root level when `None`), spliced at
    /// `index` or appended. The node's own children list is ignored;
    /// children attach through their own inserts.
    pub fn insert(
        &mut self,
        mut node: SceneNode,
        parent: Option<Uuid>,
        index: Option<usize>,
    ) -> Result<Uuid, SceneError> {
        if self.nodes.contains_key(&node.id) {
            return Err(SceneError::DuplicateNode(node.id));
        }
        let id = node.id;
        node.children.clear();
        node.parent = parent;
        match parent {
            None => match index {
                Some(i) => self.roots.insert(i.min(self.roots.len()), id),
                None => self.roots.push(id),
            },
            Some(pid) => {
                let parent_node = self
                    .nodes
                    .get_mut(&pid)
                    .ok_or(SceneError::UnknownParent(pid))?;
                match index {
                    Some(i) => {
                        let i = i.min(parent_node.children.len());
                        parent_node.children.insert(i, id);
                    }
                    None => parent_node.children.push(id),
                }
            }
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Detach and drop the node and its whole subtree. Returns the
    /// detached node itself.
    pub fn remove(&mut self, id: Uuid) -> Option<SceneNode> {
        let parent = self.nodes.get(&id)?.parent;
        match parent {
            Some(pid) => {
                if let Some(p) = self.nodes.get_mut(&pid) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|c| *c != id),
        }
        self.remove_subtree(id)
    }

    fn remove_subtree(&mut self, id: Uuid) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        for child in node.children.clone() {
            self.remove_subtree(child);
        }
        Some(node)
    }

    /// Depth-first visit of visible nodes with their accumulated world
    /// matrix. An invisible node hides its whole subtree.
    pub fn visit_visible(&self, visitor: &mut dyn FnMut(&SceneNode, &Mat4)) {
        for &root in &self.roots {
            self.visit_visible_from(root, &Mat4::IDENTITY, visitor);
        }
    }

    fn visit_visible_from(
        &self,
        id: Uuid,
        parent_world: &Mat4,
        visitor: &mut dyn FnMut(&SceneNode, &Mat4),
    ) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let world = *parent_world * node.transform.matrix();
        visitor(node, &world);
        for &child in &node.children {
            self.visit_visible_from(child, &world, visitor);
        }
    }

    fn parent_world_matrix(&self, id: Uuid) -> Option<Mat4> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes.get(&id)?.parent;
        while let Some(pid) = cursor {
            let parent = self.nodes.get(&pid)?;
            chain.push(parent);
            cursor = parent.parent;
        }
        let mut world = Mat4::IDENTITY;
        for ancestor in chain.iter().rev() {
            world *= ancestor.transform.matrix();
        }
        Some(world)
    }

    pub fn world_matrix(&self, id: Uuid) -> Option<Mat4> {
        let node = self.nodes.get(&id)?;
        Some(self.parent_world_matrix(id)? * node.transform.matrix())
    }

    /// World-space bounds of the node and all its descendants, visible
    /// or not. A subtree with no geometry collapses to a point at the
    /// node's world origin so a highlight box stays drawable.
    pub fn subtree_world_bounds(&self, id: Uuid) -> Option<Aabb> {
        let parent_world = self.parent_world_matrix(id)?;
        let mut bounds = None;
        self.accumulate_bounds(id, &parent_world, &mut bounds);
        bounds.or_else(|| {
            self.world_matrix(id)
                .map(|world| Aabb::point(world.transform_point3(Vec3::ZERO)))
        })
    }

    fn accumulate_bounds(&self, id: Uuid, parent_world: &Mat4, bounds: &mut Option<Aabb>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let world = *parent_world * node.transform.matrix();
        if let Some(geometry) = &node.geometry {
            let b = geometry.bounds.transformed(&world);
            *bounds = Some(match bounds {
                Some(acc) => acc.union(&b),
                None => b,
            });
        }
        for &child in &node.children {
            self.accumulate_bounds(child, &world, bounds);
        }
    }

    /// Visible object/vertex/triangle totals. O(total nodes); call on
    /// structural changes, not per frame.
    pub fn statistics(&self) -> SceneStatistics {
        let mut stats = SceneStatistics::default();
        self.visit_visible(&mut |node, _| {
            stats.objects += 1;
            if let Some(geometry) = &node.geometry {
                stats.vertices += geometry.vertex_count;
                stats.triangles += geometry.triangle_count();
            }
        });
        stats
    }
}
