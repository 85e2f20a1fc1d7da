//! Error types for the deck2pdf library.
//!
//! Two error types reflect two layers of the pipeline:
//!
//! * [`ExportError`]: **Fatal**: the export run cannot produce a complete
//!   document. Every variant aborts the run; there is no partial output.
//!   Returned from the top-level `export*` functions.
//!
//! * [`RendererError`]: a failure reported by the renderer session
//!   (browser launch, navigation, script evaluation, page encoding). The
//!   pipeline stage that observed it wraps it into an [`ExportError`] carrying
//!   the stage, slide coordinate or page index.

use crate::model::{ExportStage, SlideCoordinate};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the deck2pdf library.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Pre-flight errors ─────────────────────────────────────────────────
    /// Requested dimensions or timings are invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input document was not found at the given path.
    #[error("Input document not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// The renderer session failed outside of a single slide capture.
    #[error("Renderer failed while {stage}: {detail}")]
    SessionFailed { stage: ExportStage, detail: String },

    /// The loaded page does not expose a recognised slide-deck controller.
    #[error("Unsupported document '{location}': {reason}")]
    UnsupportedDocument { location: String, reason: String },

    /// Navigation, settling or page encoding failed for one slide.
    #[error("Capture failed for slide {coordinate}: {detail}")]
    CaptureFailed {
        coordinate: SlideCoordinate,
        detail: String,
    },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// A captured page could not be merged into the final document.
    #[error("Failed to assemble page {index}: {detail}")]
    AssemblyFailed { index: usize, detail: String },

    /// The final document could not be written.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// Process exit status for this error. Every category is distinct and
    /// non-zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExportError::InvalidConfig(_) => 2,
            ExportError::InputNotFound { .. } => 3,
            ExportError::UnsupportedDocument { .. } => 4,
            ExportError::CaptureFailed { .. } => 5,
            ExportError::AssemblyFailed { .. } => 6,
            ExportError::OutputWriteFailed { .. } => 7,
            ExportError::SessionFailed { .. } => 8,
            ExportError::Internal(_) => 70,
        }
    }

    pub(crate) fn session(stage: ExportStage, err: RendererError) -> Self {
        ExportError::SessionFailed {
            stage,
            detail: err.to_string(),
        }
    }
}

/// Failures reported by a [`crate::session::RendererSession`].
#[derive(Debug, Clone, Error)]
pub enum RendererError {
    /// The browser could not be started.
    #[error("failed to launch renderer: {0}")]
    Launch(String),

    /// Loading a location failed.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A script evaluated in the page threw or returned an unusable value.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    /// The renderer could not encode the current viewport as a page.
    #[error("page encoding failed: {0}")]
    Encoding(String),

    /// The renderer did not answer in time.
    #[error("renderer timed out after {0}ms")]
    Timeout(u64),

    /// The session was already closed.
    #[error("renderer session is closed")]
    Closed,
}
