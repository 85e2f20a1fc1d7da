//! Configuration types for a slide-deck export.
//!
//! What to export lives in [`ExportRequest`] (input, output, page size); how
//! to drive the renderer lives in [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. Both are immutable for the lifetime of a run.

use crate::error::ExportError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// CSS pixels per inch, as used by the renderer's print pipeline.
const CSS_PX_PER_INCH: f64 = 96.0;
/// PDF points per CSS pixel (72 / 96).
const POINTS_PER_PX: f64 = 0.75;

/// Output page size in CSS pixels. Both dimensions are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// 4K, 16:9.
    pub const DEFAULT: Resolution = Resolution {
        width: 3840,
        height: 2160,
    };

    pub fn new(width: u32, height: u32) -> Result<Self, ExportError> {
        if width == 0 || height == 0 {
            return Err(ExportError::InvalidConfig(format!(
                "Width and height must be positive integers, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Parse user-supplied width and height strings.
    pub fn parse(width: &str, height: &str) -> Result<Self, ExportError> {
        let parse_one = |name: &str, raw: &str| -> Result<u32, ExportError> {
            let value: i64 = raw.trim().parse().map_err(|_| {
                ExportError::InvalidConfig(format!(
                    "{name} must be a positive integer, got '{raw}'"
                ))
            })?;
            u32::try_from(value)
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| {
                    ExportError::InvalidConfig(format!(
                        "{name} must be a positive integer, got {value}"
                    ))
                })
        };
        Self::new(parse_one("Width", width)?, parse_one("Height", height)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Page size in inches, as the renderer's page encoder expects it.
    pub fn paper_size_inches(&self) -> (f64, f64) {
        (
            f64::from(self.width) / CSS_PX_PER_INCH,
            f64::from(self.height) / CSS_PX_PER_INCH,
        )
    }

    /// Page size in PDF points, as it appears in an encoded page's MediaBox.
    pub fn page_size_points(&self) -> (f64, f64) {
        (
            f64::from(self.width) * POINTS_PER_PX,
            f64::from(self.height) * POINTS_PER_PX,
        )
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What to export and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Local path or `http(s)://` URL of the deck.
    pub input: String,
    /// Destination of the assembled document. Overwritten on success.
    pub output: PathBuf,
    pub resolution: Resolution,
}

impl ExportRequest {
    /// A request at the default 3840×2160 resolution.
    pub fn new(input: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            resolution: Resolution::default(),
        }
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Renderer timing and launch settings.
///
/// # Example
/// ```rust
/// use deck2pdf::ExportConfig;
///
/// let config = ExportConfig::builder()
///     .settle_delay_ms(800)
///     .headless(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.settle_delay().as_millis(), 800);
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Wait after the deck loads, before enumeration. Default: 2000.
    ///
    /// Covers the deck controller's boot-time layout and any typesetting
    /// that starts on load.
    pub init_delay_ms: u64,

    /// Wait after each slide navigation, before encoding. Default: 500.
    ///
    /// Covers transition animations; the rendered content gives no
    /// completion signal.
    pub settle_delay_ms: u64,

    /// Upper bound on page load and on each renderer call. Default: 30.
    pub load_timeout_secs: u64,

    /// Run the browser without a window. Default: true.
    pub headless: bool,

    /// Keep the browser's process sandbox enabled. Default: true.
    pub sandbox: bool,

    /// Browser executable. `None` auto-detects an installed Chrome/Chromium.
    pub chrome_executable: Option<PathBuf>,

    /// Parent directory for per-slide intermediate documents. `None` uses the
    /// system temp directory.
    pub scratch_dir: Option<PathBuf>,

    /// Receives per-slide progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            init_delay_ms: 2000,
            settle_delay_ms: 500,
            load_timeout_secs: 30,
            headless: true,
            sandbox: true,
            chrome_executable: None,
            scratch_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("init_delay_ms", &self.init_delay_ms)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("load_timeout_secs", &self.load_timeout_secs)
            .field("headless", &self.headless)
            .field("sandbox", &self.sandbox)
            .field("chrome_executable", &self.chrome_executable)
            .field("scratch_dir", &self.scratch_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExportProgressCallback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn init_delay(&self) -> Duration {
        Duration::from_millis(self.init_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn init_delay_ms(mut self, ms: u64) -> Self {
        self.config.init_delay_ms = ms;
        self
    }

    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    pub fn load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.load_timeout_secs = secs;
        self
    }

    pub fn headless(mut self, v: bool) -> Self {
        self.config.headless = v;
        self
    }

    pub fn sandbox(mut self, v: bool) -> Self {
        self.config.sandbox = v;
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        if self.config.load_timeout_secs == 0 {
            return Err(ExportError::InvalidConfig(
                "Load timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
