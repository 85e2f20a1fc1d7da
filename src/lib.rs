//! # deck2pdf
//!
//! Export browser-rendered slide decks (reveal.js) to a single paginated PDF,
//! one page per slide, at a fixed pixel resolution.
//!
//! ## Why drive a browser?
//!
//! A deck is laid out by its own CSS and JavaScript: transitions, web fonts,
//! math typesetting, vertical sub-slides. Printing the page with print
//! stylesheets produces something the author never designed. Instead this
//! crate opens the deck in headless Chrome with *screen* media, visits every
//! slide, and captures exactly what the viewport shows.
//!
//! ## Pipeline Overview
//!
//! ```text
//! deck.html
//!  │
//!  ├─ 1. Input      check the file exists (before any browser starts)
//!  ├─ 2. Load       open the deck, fix the viewport, emulate screen media
//!  ├─ 3. Enumerate  ask the deck for its horizontal/vertical slide layout
//!  ├─ 4. Capture    per slide: navigate, settle, encode a one-page PDF
//!  ├─ 5. Assemble   copy each page into the output, in slide order
//!  └─ 6. Output     atomic write; browser closed on every path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deck2pdf::{export, ExportConfig, ExportRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ExportRequest::new("slides/index.html", "slides.pdf");
//!     let summary = export(&request, &ExportConfig::default()).await?;
//!     eprintln!("{} pages written", summary.page_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `chrome` | on      | Headless Chrome renderer session (`headless_chrome`) |
//! | `cli`    | on      | Enables the `deck2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Without `chrome`, bring your own renderer by implementing
//! [`SessionLauncher`] and calling [`export_with`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod deck;
pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExportConfig, ExportConfigBuilder, ExportRequest, Resolution};
pub use deck::DeckQuery;
pub use error::{ExportError, RendererError};
pub use export::{export_blocking, export_with};
#[cfg(feature = "chrome")]
pub use export::{export, export_sync};
pub use model::{ExportStage, ExportSummary, SlideCoordinate, SlideManifest};
pub use progress::{ExportProgressCallback, NoopProgressCallback, ProgressCallback};
#[cfg(feature = "chrome")]
pub use session::chrome::{ChromeLauncher, ChromeSession};
pub use session::{MediaType, RendererSession, SessionLauncher, SessionOptions};
