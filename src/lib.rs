//! jscene - embeddable 3D scene editor core.
//!
//! Owns a live scene graph (nodes, camera, selection, per-frame loop),
//! resolves pointer clicks to nodes by ray casting, and keeps the live
//! state in sync with a host-owned JSON document without feedback
//! loops. Rendering, windowing and the host's text-buffer model are
//! external collaborators behind small traits and message types.

pub mod events;
pub mod render;
pub mod scene;
pub mod sync;

pub use events::{EventKind, ViewportEvent};
pub use render::camera::Camera;
pub use render::{HostMessage, NullRenderer, Renderer, Viewport, ViewportConfig};
pub use scene::fingerprint::ContentFingerprint;
pub use scene::serialization::SceneDocument;
pub use scene::{SceneGraph, SceneNode, SceneStatistics};
pub use sync::{DisplayState, HostWrite, InboundOutcome, SyncCoordinator};
