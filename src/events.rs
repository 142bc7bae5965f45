//! Event subscription registry for the viewport runtime.
//!
//! Listeners subscribe per event category and receive events over a
//! channel. Events are delivered to subscribers of a category in
//! registration order; a dropped receiver is pruned on the next emit.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use uuid::Uuid;

use crate::scene::SceneStatistics;

/// Category of a viewport event, used as a subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ObjectAdded,
    ObjectRemoved,
    GraphChanged,
    SelectionChanged,
    StatsChanged,
    CameraReset,
}

/// Notification emitted by the viewport runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    ObjectAdded { node: Uuid },
    ObjectRemoved { node: Uuid },
    GraphChanged,
    SelectionChanged { node: Option<Uuid> },
    StatsChanged { stats: SceneStatistics, frametime_ms: f32 },
    CameraReset { camera: Uuid },
}

impl ViewportEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ViewportEvent::ObjectAdded { .. } => EventKind::ObjectAdded,
            ViewportEvent::ObjectRemoved { .. } => EventKind::ObjectRemoved,
            ViewportEvent::GraphChanged => EventKind::GraphChanged,
            ViewportEvent::SelectionChanged { .. } => EventKind::SelectionChanged,
            ViewportEvent::StatsChanged { .. } => EventKind::StatsChanged,
            ViewportEvent::CameraReset { .. } => EventKind::CameraReset,
        }
    }
}

#[derive(Default)]
pub struct EventHub {
    subscribers: HashMap<EventKind, Vec<Sender<ViewportEvent>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in one event category.
    pub fn subscribe(&mut self, kind: EventKind) -> Receiver<ViewportEvent> {
        let (tx, rx) = channel();
        self.subscribers.entry(kind).or_default().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber of its category.
    pub fn emit(&mut self, event: ViewportEvent) {
        if let Some(list) = self.subscribers.get_mut(&event.kind()) {
            list.retain(|tx| tx.send(event).is_ok());
        }
    }
}
