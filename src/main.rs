//! jscene - headless scene document host.
//!
//! Loads a `.jscene` document, applies it to a viewport through the
//! sync coordinator, scaffolds a starter scene when the document is
//! empty, and writes genuine changes back to the file as whole-document
//! replacements. Useful for smoke-testing documents and as a reference
//! for embedding the editor core in a real host.

use std::path::PathBuf;
use std::time::Instant;

use jscene::events::EventKind;
use jscene::render::{NullRenderer, Viewport};
use jscene::sync::{DisplayState, SyncCoordinator};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        log::error!("usage: jscene <scene.jscene>");
        std::process::exit(2);
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            log::error!("cannot read {}: {err}", path.display());
            std::process::exit(1);
        }
    };
    // a brand-new file reads as an empty document
    let text = if text.trim().is_empty() {
        "{}".to_string()
    } else {
        text
    };

    let mut viewport = Viewport::new(NullRenderer);
    let mut coordinator = SyncCoordinator::new();
    let graph_changes = viewport.subscribe(EventKind::GraphChanged);

    coordinator.document_updated(&mut viewport, &text);
    if coordinator.display_state() == DisplayState::InvalidDocument {
        log::error!("{} is not a valid scene document", path.display());
        std::process::exit(1);
    }

    let mut dirty = false;
    if viewport.graph().is_empty() {
        log::info!("empty scene, scaffolding a starter cube and light");
        viewport.scaffold();
        dirty = true;
    }

    viewport.render_once(Instant::now());

    let stats = viewport.statistics();
    log::info!(
        "{}: {} objects, {} vertices, {} triangles",
        path.display(),
        stats.objects,
        stats.vertices,
        stats.triangles
    );

    // Flush pending change notifications (plus the scaffold, which adds
    // objects without marking the graph changed).
    dirty |= graph_changes.try_iter().count() > 0;
    if dirty {
        if let Some(write) = coordinator.graph_changed(&viewport) {
            if let Err(err) = std::fs::write(&path, write.text) {
                log::error!("cannot write {}: {err}", path.display());
                std::process::exit(1);
            }
            log::info!("wrote {}", path.display());
        }
    }
}
