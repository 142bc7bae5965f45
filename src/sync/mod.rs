//! Document/viewport synchronization.
//!
//! The host document and the live scene share one mutable state, so a
//! change applied in either direction comes back around as a change
//! notification from the other. The coordinator breaks that loop by
//! fingerprinting content: an inbound update whose fingerprint matches
//! the last applied state is an echo and is dropped; an outbound
//! serialization whose fingerprint matches is a no-op and is never
//! forwarded. Comparing content (not tracking "who caused this") is
//! what makes this safe when both directions race on the same document.

use crate::render::{HostMessage, Renderer, Viewport};
use crate::scene::fingerprint::ContentFingerprint;
use crate::scene::serialization::SceneDocument;

/// What the editor surface should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Scene,
    /// The document text is not valid JSON; the scene keeps its last
    /// good state and stays hidden behind a placeholder.
    InvalidDocument,
}

/// Outcome of an inbound document update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// New content was applied to the live scene.
    Applied,
    /// The update matched the last applied state; nothing was done.
    Echo,
    /// The text did not parse; the scene was left untouched.
    Invalid,
}

/// Whole-document replacement for the host to apply as one atomic edit.
#[derive(Debug, Clone, PartialEq)]
pub struct HostWrite {
    pub text: String,
}

#[derive(Default)]
pub struct SyncCoordinator {
    last_applied: Option<ContentFingerprint>,
    display: DisplayState,
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_state(&self) -> DisplayState {
        self.display
    }

    /// Route an inbound host message. Document updates are handled
    /// here; everything else passes through to the viewport.
    pub fn handle_message<R: Renderer>(
        &mut self,
        viewport: &mut Viewport<R>,
        message: HostMessage,
    ) -> Option<InboundOutcome> {
        match message {
            HostMessage::DocumentUpdated { text } => {
                Some(self.document_updated(viewport, &text))
            }
            other => {
                viewport.handle_message(other);
                None
            }
        }
    }

    /// Apply an inbound document update, unless it is invalid or an
    /// echo of a change the scene itself produced.
    pub fn document_updated<R: Renderer>(
        &mut self,
        viewport: &mut Viewport<R>,
        text: &str,
    ) -> InboundOutcome {
        let doc = match SceneDocument::parse(text) {
            Ok(doc) => doc,
            Err(err) => {
                log::warn!("document is not valid JSON: {err}");
                self.display = DisplayState::InvalidDocument;
                return InboundOutcome::Invalid;
            }
        };
        self.display = DisplayState::Scene;

        let fingerprint = match ContentFingerprint::of_document(&doc) {
            Ok(fp) => fp,
            Err(err) => {
                log::warn!("could not fingerprint document: {err}");
                return InboundOutcome::Invalid;
            }
        };
        if self.last_applied == Some(fingerprint) {
            log::debug!("dropping echoed document update {fingerprint}");
            return InboundOutcome::Echo;
        }

        self.last_applied = Some(fingerprint);
        viewport.from_document(&doc);
        InboundOutcome::Applied
    }

    /// React to the runtime's `GraphChanged` event: serialize the live
    /// state and forward it to the host only when the content actually
    /// differs from the last applied state.
    pub fn graph_changed<R: Renderer>(&mut self, viewport: &Viewport<R>) -> Option<HostWrite> {
        let doc = viewport.to_document();
        let fingerprint = match ContentFingerprint::of_document(&doc) {
            Ok(fp) => fp,
            Err(err) => {
                log::warn!("could not fingerprint scene state: {err}");
                return None;
            }
        };
        if self.last_applied == Some(fingerprint) {
            return None;
        }

        self.last_applied = Some(fingerprint);
        match doc.to_text() {
            Ok(text) => Some(HostWrite { text }),
            Err(err) => {
                log::warn!("could not serialize scene state: {err}");
                None
            }
        }
    }
}
