//! Export entry points: the pipeline controller.
//!
//! One run walks a fixed sequence of stages:
//!
//! ```text
//! Idle → SessionOpened → DocumentLoaded → MediaEmulated → Enumerated
//!      → Capturing(0..N) → Assembling → Serialized → Closed
//! ```
//!
//! Any failure jumps straight to `Closed`. The renderer session is closed on
//! every path, and the output file is only touched once every slide has been
//! captured and merged.
//!
//! The renderer client and the PDF library are both blocking, so the async
//! entry points move the whole run onto `spawn_blocking`.

use crate::config::{ExportConfig, ExportRequest};
use crate::error::ExportError;
use crate::model::{ExportStage, ExportSummary, SlideManifest};
use crate::pipeline::assemble::DocumentAssembler;
use crate::pipeline::capture::capture_slide;
use crate::pipeline::enumerate::enumerate_slides;
use crate::pipeline::input::{resolve_input, ResolvedInput};
use crate::session::{MediaType, RendererSession, SessionLauncher, SessionOptions};
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Export a deck to a multi-page PDF using a local headless Chrome.
///
/// # Example
/// ```rust,no_run
/// use deck2pdf::{export, ExportConfig, ExportRequest, Resolution};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = ExportRequest::new("talk/index.html", "talk.pdf")
///     .with_resolution(Resolution::new(1920, 1080)?);
/// let summary = export(&request, &ExportConfig::default()).await?;
/// println!("{} pages → {}", summary.page_count(), summary.output.display());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "chrome")]
pub async fn export(
    request: &ExportRequest,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    export_with(
        crate::session::chrome::ChromeLauncher,
        request.clone(),
        config.clone(),
    )
    .await
}

/// Synchronous wrapper around [`export`].
///
/// Creates a temporary tokio runtime internally.
#[cfg(feature = "chrome")]
pub fn export_sync(
    request: &ExportRequest,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(export(request, config))
}

/// Export with a caller-supplied renderer backend.
pub async fn export_with<L>(
    launcher: L,
    request: ExportRequest,
    config: ExportConfig,
) -> Result<ExportSummary, ExportError>
where
    L: SessionLauncher + Send + 'static,
{
    tokio::task::spawn_blocking(move || export_blocking(&launcher, &request, &config))
        .await
        .map_err(|e| ExportError::Internal(format!("Export task panicked: {}", e)))?
}

/// Run the whole pipeline on the current thread.
pub fn export_blocking<L>(
    launcher: &L,
    request: &ExportRequest,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError>
where
    L: SessionLauncher + ?Sized,
{
    let start = Instant::now();
    info!(
        "Exporting {} to {} at {}",
        request.input,
        request.output.display(),
        request.resolution
    );

    // ── Idle: pre-flight, nothing launched yet ───────────────────────────
    let input = resolve_input(&request.input)?;
    let scratch = scratch_dir(config.scratch_dir.as_deref())?;

    // ── Idle → SessionOpened ─────────────────────────────────────────────
    let options = SessionOptions::from_config(request.resolution, config);
    let mut session = launcher
        .launch(&options)
        .map_err(|e| ExportError::session(ExportStage::SessionOpened, e))?;

    let result = run_session(&mut session, &input, request, config, scratch.path());

    // ── → Closed, on every path ──────────────────────────────────────────
    if let Err(e) = session.close() {
        warn!("Failed to close renderer session: {}", e);
    }
    if let Err(e) = scratch.close() {
        warn!("Failed to remove scratch directory: {}", e);
    }

    let (manifest, bytes_written) = result?;
    let summary = ExportSummary {
        input: input.location().to_string(),
        output: request.output.clone(),
        resolution: request.resolution,
        reported_total: manifest.reported_total(),
        coordinates: manifest.coordinates().to_vec(),
        bytes_written,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Export complete: {} pages, {} bytes, {}ms",
        summary.page_count(),
        summary.bytes_written,
        summary.duration_ms
    );
    Ok(summary)
}

/// Per-run directory holding the intermediate single-page documents.
fn scratch_dir(parent: Option<&Path>) -> Result<TempDir, ExportError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("deck2pdf-");
    match parent {
        Some(dir) => builder.tempdir_in(dir),
        None => builder.tempdir(),
    }
    .map_err(|e| ExportError::Internal(format!("cannot create scratch directory: {e}")))
}

/// Everything between opening and closing the session.
fn run_session<S>(
    session: &mut S,
    input: &ResolvedInput,
    request: &ExportRequest,
    config: &ExportConfig,
    scratch: &Path,
) -> Result<(SlideManifest, u64), ExportError>
where
    S: RendererSession + ?Sized,
{
    let resolution = request.resolution;
    let location = input.location();

    // ── SessionOpened → DocumentLoaded ───────────────────────────────────
    debug!("Stage: {}", ExportStage::DocumentLoaded);
    session
        .set_viewport(resolution.width(), resolution.height())
        .map_err(|e| ExportError::session(ExportStage::DocumentLoaded, e))?;
    session
        .navigate(location)
        .map_err(|e| ExportError::session(ExportStage::DocumentLoaded, e))?;

    // ── DocumentLoaded → MediaEmulated ───────────────────────────────────
    // Print stylesheets would not match the layout the deck was authored for.
    debug!("Stage: {}", ExportStage::MediaEmulated);
    session
        .emulate_media(MediaType::Screen)
        .map_err(|e| ExportError::session(ExportStage::MediaEmulated, e))?;
    session.wait(config.init_delay());

    // ── MediaEmulated → Enumerated ───────────────────────────────────────
    debug!("Stage: {}", ExportStage::Enumerated);
    let manifest = enumerate_slides(session, location)?;
    let total = manifest.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_start(manifest.reported_total());
    }

    // ── Enumerated → Capturing(i), strictly sequential ───────────────────
    let mut assembler = DocumentAssembler::new();
    for (index, &coordinate) in manifest.iter().enumerate() {
        debug!("Stage: {}", ExportStage::Capturing(index));
        info!(
            "Rendering slide {}/{} {}",
            index + 1,
            manifest.reported_total(),
            coordinate
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_slide_start(index, total, coordinate);
        }

        let page = capture_slide(
            session,
            index,
            coordinate,
            resolution,
            config.settle_delay(),
            scratch,
        )?;
        let len = page.len();
        assembler.append(page)?;

        if let Some(ref cb) = config.progress_callback {
            cb.on_slide_complete(index, total, len);
        }
    }

    // ── Assembling → Serialized ──────────────────────────────────────────
    debug!("Stage: {}", ExportStage::Assembling);
    let bytes_written = assembler.write_to(&request.output)?;
    debug!("Stage: {}", ExportStage::Serialized);

    if let Some(ref cb) = config.progress_callback {
        cb.on_export_complete(total);
    }
    Ok((manifest, bytes_written))
}
