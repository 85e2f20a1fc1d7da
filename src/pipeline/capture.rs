//! Single-slide capture: navigate, settle, encode, materialise.
//!
//! The renderer can only emit whole documents, so each slide becomes its own
//! one-page PDF. It is written to a private temp file inside the run's
//! scratch directory; the file lives exactly as long as the returned
//! [`CapturedPage`] and is removed when the page is dropped, whether or not
//! assembly succeeded.

use crate::config::Resolution;
use crate::deck::DeckQuery;
use crate::error::ExportError;
use crate::model::SlideCoordinate;
use crate::session::RendererSession;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::debug;

/// A finalised single-page document for one slide.
#[derive(Debug)]
pub struct CapturedPage {
    index: usize,
    coordinate: SlideCoordinate,
    resolution: Resolution,
    len: usize,
    file: NamedTempFile,
}

impl CapturedPage {
    /// 0-based manifest index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn coordinate(&self) -> SlideCoordinate {
        self.coordinate
    }

    /// Declared page size in CSS pixels.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Size of the encoded document in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Location of the intermediate document. Valid until `self` is dropped.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Capture one slide.
///
/// Navigation may return before the transition finishes; `settle` is an
/// unconditional wait that covers it.
pub fn capture_slide<S>(
    session: &mut S,
    index: usize,
    coordinate: SlideCoordinate,
    resolution: Resolution,
    settle: Duration,
    scratch_dir: &Path,
) -> Result<CapturedPage, ExportError>
where
    S: RendererSession + ?Sized,
{
    let failed = |detail: String| ExportError::CaptureFailed { coordinate, detail };

    session
        .evaluate(&DeckQuery::GoTo(coordinate).script())
        .map_err(|e| failed(e.to_string()))?;

    session.wait(settle);

    let bytes = session
        .encode_viewport_as_page(resolution.width(), resolution.height())
        .map_err(|e| failed(e.to_string()))?;
    if bytes.is_empty() {
        return Err(failed("renderer returned an empty document".into()));
    }

    let mut file = tempfile::Builder::new()
        .prefix(&format!("slide-{index:04}-"))
        .suffix(".pdf")
        .tempfile_in(scratch_dir)
        .map_err(|e| failed(format!("cannot create intermediate file: {e}")))?;
    file.write_all(&bytes)
        .and_then(|_| file.flush())
        .map_err(|e| failed(format!("cannot write intermediate file: {e}")))?;

    debug!(
        "Captured slide {} {} → {} bytes at {}",
        index + 1,
        coordinate,
        bytes.len(),
        file.path().display()
    );

    Ok(CapturedPage {
        index,
        coordinate,
        resolution,
        len: bytes.len(),
        file,
    })
}
