//! Slide enumeration: ask the deck controller for its layout and build the
//! traversal manifest.
//!
//! Only read-only queries are issued; the deck is left on whatever slide it
//! was showing.

use crate::deck::DeckQuery;
use crate::error::ExportError;
use crate::model::{ExportStage, SlideManifest};
use crate::session::RendererSession;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Build the manifest for the deck currently loaded in `session`.
///
/// `location` is only used in error messages.
pub fn enumerate_slides<S>(session: &mut S, location: &str) -> Result<SlideManifest, ExportError>
where
    S: RendererSession + ?Sized,
{
    let present = query(session, DeckQuery::IsPresent)?;
    if present != Value::Bool(true) {
        return Err(ExportError::UnsupportedDocument {
            location: location.to_string(),
            reason: "no reveal.js deck controller detected".into(),
        });
    }

    let reported_total = count(session, location, DeckQuery::TotalSlides)?;
    let horizontal = count(session, location, DeckQuery::HorizontalSlides)?;
    if horizontal == 0 {
        return Err(ExportError::UnsupportedDocument {
            location: location.to_string(),
            reason: "deck contains no slides".into(),
        });
    }

    let mut vertical_counts = Vec::with_capacity(horizontal as usize);
    for h in 0..horizontal {
        let v = count(session, location, DeckQuery::VerticalSlides(h))?;
        debug!("Horizontal slide {} has {} vertical slide(s)", h, v);
        vertical_counts.push(v);
    }

    let manifest = SlideManifest::from_vertical_counts(&vertical_counts, reported_total as usize);
    if !manifest.is_reconciled() {
        warn!(
            "Deck reports {} slides but {} were enumerated; exporting the enumerated slides",
            manifest.reported_total(),
            manifest.len()
        );
    }
    info!(
        "Detected deck with {} slides ({} horizontal)",
        manifest.len(),
        horizontal
    );
    Ok(manifest)
}

fn query<S>(session: &mut S, q: DeckQuery) -> Result<Value, ExportError>
where
    S: RendererSession + ?Sized,
{
    session
        .evaluate(&q.script())
        .map_err(|e| ExportError::session(ExportStage::Enumerated, e))
}

/// Run a counting query; anything but a non-negative integer means the page
/// is not a deck we understand.
fn count<S>(session: &mut S, location: &str, q: DeckQuery) -> Result<u32, ExportError>
where
    S: RendererSession + ?Sized,
{
    let value = query(session, q)?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ExportError::UnsupportedDocument {
            location: location.to_string(),
            reason: format!("deck controller returned {value} for `{}`", q.script()),
        })
}
