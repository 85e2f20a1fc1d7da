//! Progress-callback trait for per-slide export events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to receive events
//! as the pipeline captures each slide.
//!
//! # Example
//!
//! ```rust
//! use deck2pdf::{ExportConfig, ExportProgressCallback, SlideCoordinate};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     captured: AtomicUsize,
//! }
//!
//! impl ExportProgressCallback for CountingCallback {
//!     fn on_slide_complete(&self, index: usize, total: usize, bytes: usize) {
//!         self.captured.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Slide {}/{} captured ({} bytes)", index + 1, total, bytes);
//!     }
//! }
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { captured: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::model::SlideCoordinate;
use std::sync::Arc;

/// Called by the export pipeline as it works through the manifest.
///
/// Events arrive strictly in manifest order from the thread running the
/// pipeline. The trait is `Send + Sync` because that thread is a blocking
/// pool thread, not the caller's. All methods default to no-ops.
pub trait ExportProgressCallback: Send + Sync {
    /// Called once after enumeration, before the first capture.
    ///
    /// `reported_total` is the deck controller's own count and may differ
    /// from the number of captures that follow.
    fn on_export_start(&self, reported_total: usize) {
        let _ = reported_total;
    }

    /// Called before navigating to a slide. `index` is 0-based.
    fn on_slide_start(&self, index: usize, total: usize, coordinate: SlideCoordinate) {
        let _ = (index, total, coordinate);
    }

    /// Called after a slide's page has been appended to the document.
    ///
    /// `bytes` is the size of the single-page document the renderer produced.
    fn on_slide_complete(&self, index: usize, total: usize, bytes: usize) {
        let _ = (index, total, bytes);
    }

    /// Called once after the document has been written.
    fn on_export_complete(&self, pages: usize) {
        let _ = pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;
