//! Frame timing and statistics rate limiting.

use std::time::{Duration, Instant};

use crate::scene::SceneStatistics;

/// Per-frame delta tracking.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    pub frame_dt: f32,
}

impl FrameTiming {
    pub fn new() -> Self {
        Self {
            last_frame_time: None,
            frame_dt: 1.0 / 60.0,
        }
    }

    pub fn update(&mut self, now: Instant) {
        let dt = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt.as_secs_f32().max(0.0);
    }
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapses statistics updates so at most one fires per window. The
/// first update in a window fires immediately; later ones are held and
/// the most recent values flush once the window expires.
pub struct StatsThrottle {
    window: Duration,
    last_emit: Option<Instant>,
    pending: Option<(SceneStatistics, f32)>,
}

impl StatsThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_emit: None,
            pending: None,
        }
    }

    /// Offer the latest values; returns the payload to emit now, if any.
    pub fn offer(
        &mut self,
        stats: SceneStatistics,
        frametime_ms: f32,
        now: Instant,
    ) -> Option<(SceneStatistics, f32)> {
        match self.last_emit {
            Some(last) if now.saturating_duration_since(last) < self.window => {
                self.pending = Some((stats, frametime_ms));
                None
            }
            _ => {
                self.last_emit = Some(now);
                self.pending = None;
                Some((stats, frametime_ms))
            }
        }
    }

    /// Flush a held update once the window has expired.
    pub fn poll(&mut self, now: Instant) -> Option<(SceneStatistics, f32)> {
        let last = self.last_emit?;
        if now.saturating_duration_since(last) < self.window {
            return None;
        }
        let payload = self.pending.take()?;
        self.last_emit = Some(now);
        Some(payload)
    }
}
