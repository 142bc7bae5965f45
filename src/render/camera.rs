use glam::{Mat3, Quat, Vec3};
use uuid::Uuid;

use crate::scene::serialization::SerializedCamera;
use crate::scene::Aabb;

/// Perspective editor camera. The id is the stable identity external
/// holders key on; a document reload replaces every field in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub id: Uuid,
    pub name: String,
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Camera {
    /// The default editor camera: 50 degree fov, parked at (5, 5, 10)
    /// looking at the origin.
    pub fn editor_default() -> Self {
        let position = Vec3::new(5.0, 5.0, 10.0);
        Self {
            id: Uuid::new_v4(),
            name: "Camera".to_string(),
            fov_deg: 50.0,
            aspect: 1.0,
            near: 0.01,
            far: 1000.0,
            position,
            rotation: look_at_rotation(position, Vec3::ZERO, Vec3::Y),
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.rotation = look_at_rotation(self.position, target, Vec3::Y);
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Ray through a point given in normalized device coordinates
    /// ([-1, 1] on both axes, +y up).
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let tan_half = (self.fov_deg.to_radians() * 0.5).tan();
        let local = Vec3::new(ndc_x * tan_half * self.aspect, ndc_y * tan_half, -1.0);
        Ray {
            origin: self.position,
            dir: (self.rotation * local).normalize(),
        }
    }

    pub fn to_serialized(&self) -> SerializedCamera {
        SerializedCamera {
            id: self.id,
            name: self.name.clone(),
            fov: self.fov_deg,
            aspect: self.aspect,
            near: self.near,
            far: self.far,
            position: self.position,
            rotation: self.rotation,
        }
    }

    /// Copy every field, id included, from the persisted form.
    pub fn apply_serialized(&mut self, s: &SerializedCamera) {
        self.id = s.id;
        self.name = s.name.clone();
        self.fov_deg = s.fov;
        self.aspect = s.aspect;
        self.near = s.near;
        self.far = s.far;
        self.position = s.position;
        self.rotation = s.rotation;
    }
}

/// World rotation for a camera at `eye` looking at `target`.
pub fn look_at_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    let forward = (target - eye).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let z = -forward;
    let mut x = up.cross(z).normalize_or_zero();
    if x == Vec3::ZERO {
        // looking straight up or down
        x = Vec3::X;
    }
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// Picking ray in world space.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Slab test. Returns the nearest non-negative hit distance; an
    /// origin inside the box reports distance zero.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let mut tmin = 0.0f32;
        let mut tmax = f32::INFINITY;
        for axis in 0..3 {
            let origin = self.origin[axis];
            let dir = self.dir[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
            if dir.abs() < 1e-12 {
                if origin < lo || origin > hi {
                    return None;
                }
            } else {
                let inv = 1.0 / dir;
                let mut t1 = (lo - origin) * inv;
                let mut t2 = (hi - origin) * inv;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                tmin = tmin.max(t1);
                tmax = tmax.min(t2);
                if tmin > tmax {
                    return None;
                }
            }
        }
        Some(tmin)
    }
}

/// Orbit-style camera controls. Disabled while a gizmo drag is active
/// so the two interactions do not fight over the pointer.
#[derive(Debug, Clone, Copy)]
pub struct OrbitControls {
    pub enabled: bool,
    pub pivot: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self {
            enabled: true,
            pivot: Vec3::ZERO,
        }
    }

    /// Rotate the camera around the pivot, keeping its distance.
    pub fn orbit(&self, camera: &mut Camera, yaw_delta: f32, pitch_delta: f32) {
        if !self.enabled {
            return;
        }
        let offset = camera.position - self.pivot;
        let radius = offset.length().max(0.05);
        let mut yaw = offset.z.atan2(offset.x);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        yaw += yaw_delta;
        pitch = (pitch + pitch_delta).clamp(-1.55, 1.55);
        let cos_pitch = pitch.cos();
        camera.position = self.pivot
            + radius * Vec3::new(cos_pitch * yaw.cos(), pitch.sin(), cos_pitch * yaw.sin());
        camera.look_at(self.pivot);
    }

    /// Move toward (positive) or away from the pivot.
    pub fn dolly(&self, camera: &mut Camera, amount: f32) {
        if !self.enabled {
            return;
        }
        let offset = camera.position - self.pivot;
        let distance = (offset.length() - amount).max(0.05);
        camera.position = self.pivot + offset.normalize_or_zero() * distance;
    }
}
