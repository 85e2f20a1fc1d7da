//! CLI binary for deck2pdf.
//!
//! A thin shim over the library crate that maps CLI arguments to an
//! `ExportRequest` / `ExportConfig`, shows progress, and turns failures into
//! distinct exit codes.

use anyhow::{Context, Result};
use clap::Parser;
use deck2pdf::{
    export, ExportConfig, ExportError, ExportProgressCallback, ExportRequest, ProgressCallback,
    Resolution, SlideCoordinate,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while Chrome boots and the deck loads, then a bar once the slide
/// count is known.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Launching browser and loading deck…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_export_start(&self, reported_total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} slides  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_style(style);
        self.bar.set_prefix("Capturing");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Detected deck with {reported_total} slides"))
        ));
    }

    fn on_slide_start(&self, _index: usize, total: usize, coordinate: SlideCoordinate) {
        // The enumerated count is authoritative for the bar length.
        self.bar.set_length(total as u64);
        self.bar.set_message(coordinate.to_string());
    }

    fn on_slide_complete(&self, index: usize, total: usize, bytes: usize) {
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{:>8} bytes", bytes)),
        ));
        self.bar.inc(1);
    }

    fn on_export_complete(&self, _pages: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # 4K export (default 3840x2160)
  deck2pdf talk/index.html talk.pdf

  # 1080p export
  deck2pdf talk/index.html talk.pdf 1920 1080

  # Slow decks (heavy math or animations): wait longer per slide
  deck2pdf --settle-delay-ms 1500 --init-delay-ms 4000 talk.html talk.pdf

  # Watch the browser while it works
  deck2pdf --headed talk.html talk.pdf

  # Inside a container
  deck2pdf --no-sandbox --chrome /usr/bin/chromium talk.html talk.pdf

COMMON RESOLUTIONS:
  1920 1080   1080p
  2560 1440   1440p
  3840 2160   4K (default)

EXIT STATUS:
  0   success
  2   invalid configuration (width/height, timeouts)
  3   input file not found
  4   not a reveal.js deck
  5   a slide failed to capture
  6   a captured page could not be merged
  7   the output file could not be written
  8   the browser failed (launch, load)

ENVIRONMENT VARIABLES:
  RUST_LOG                Override the log filter (e.g. deck2pdf=debug)
"#;

/// Export reveal.js slide decks to PDF, one page per slide.
#[derive(Parser, Debug)]
#[command(
    name = "deck2pdf",
    version,
    about = "Export reveal.js slide decks to PDF, one page per slide",
    long_about = "Open an HTML slide deck in headless Chrome with screen media, visit every \
slide (including vertical sub-slides) and merge the captured pages into a single PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Deck to export: local HTML file or HTTP/HTTPS URL.
    input: String,

    /// Output PDF path. Overwritten on success, untouched on failure.
    output: PathBuf,

    /// Page width in pixels (give together with HEIGHT). Default: 3840.
    #[arg(requires = "height", allow_negative_numbers = true)]
    width: Option<String>,

    /// Page height in pixels (give together with WIDTH). Default: 2160.
    #[arg(requires = "width", allow_negative_numbers = true)]
    height: Option<String>,

    /// Wait after the deck loads, before enumerating slides.
    #[arg(long, env = "DECK2PDF_INIT_DELAY_MS", default_value_t = 2000)]
    init_delay_ms: u64,

    /// Wait after each slide navigation, before capturing.
    #[arg(long, env = "DECK2PDF_SETTLE_DELAY_MS", default_value_t = 500)]
    settle_delay_ms: u64,

    /// Page-load and per-call browser timeout in seconds.
    #[arg(long, env = "DECK2PDF_LOAD_TIMEOUT", default_value_t = 30)]
    load_timeout: u64,

    /// Show the browser window (debugging). It is still closed at the end.
    #[arg(long, env = "DECK2PDF_HEADED")]
    headed: bool,

    /// Disable Chrome's process sandbox (needed in some containers).
    #[arg(long, env = "DECK2PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// Chrome/Chromium executable. Auto-detected when omitted.
    #[arg(long, env = "DECK2PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Directory for intermediate per-slide files.
    #[arg(long, env = "DECK2PDF_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Print a JSON export summary on stdout.
    #[arg(long, env = "DECK2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DECK2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DECK2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DECK2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides all the feedback that matters; keep library
    // INFO logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", red("✘"), err);
            let code = err
                .downcast_ref::<ExportError>()
                .map(ExportError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    // Dimensions are validated before any browser is launched.
    let resolution = match (&cli.width, &cli.height) {
        (Some(w), Some(h)) => Resolution::parse(w, h)?,
        _ => Resolution::default(),
    };
    let request =
        ExportRequest::new(cli.input.clone(), cli.output.clone()).with_resolution(resolution);

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExportProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} Converting {} to PDF at {}…",
            cyan("◆"),
            bold(&cli.input),
            resolution
        );
    }

    let summary = export(&request, &config).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            summary.page_count(),
            summary.duration_ms,
            bold(&summary.output.display().to_string()),
        );
        if summary.reported_total != summary.page_count() {
            eprintln!(
                "   {}",
                dim(&format!(
                    "deck reported {} slides; exported the {} enumerated",
                    summary.reported_total,
                    summary.page_count()
                ))
            );
        }
    }
    Ok(())
}

/// Map CLI args to `ExportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExportConfig> {
    let mut builder = ExportConfig::builder()
        .init_delay_ms(cli.init_delay_ms)
        .settle_delay_ms(cli.settle_delay_ms)
        .load_timeout_secs(cli.load_timeout)
        .headless(!cli.headed)
        .sandbox(!cli.no_sandbox);

    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_executable(chrome);
    }
    if let Some(ref dir) = cli.scratch_dir {
        builder = builder.scratch_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}
