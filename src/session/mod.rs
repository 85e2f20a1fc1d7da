//! Renderer session: the browser the pipeline drives.
//!
//! The pipeline never talks to a browser directly. It sees a
//! [`RendererSession`]: one page with a fixed viewport that can load a
//! location, switch CSS media, evaluate scripts, and encode whatever it is
//! currently showing as a single-page document. A [`SessionLauncher`] creates
//! sessions, which keeps "was a browser started at all?" observable and lets
//! callers bring their own backend.
//!
//! The session is a single mutable resource owned exclusively by the pipeline
//! controller for the whole run; every method takes `&mut self`.

#[cfg(feature = "chrome")]
pub mod chrome;

use crate::config::{ExportConfig, Resolution};
use crate::error::RendererError;
use std::path::PathBuf;
use std::time::Duration;

/// Which CSS media type the page renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Screen,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Screen => "screen",
        }
    }
}

/// Launch parameters handed to a [`SessionLauncher`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub viewport: Resolution,
    pub headless: bool,
    pub sandbox: bool,
    pub executable: Option<PathBuf>,
    /// Bound on page loads and individual renderer calls.
    pub timeout: Duration,
}

impl SessionOptions {
    pub fn from_config(viewport: Resolution, config: &ExportConfig) -> Self {
        Self {
            viewport,
            headless: config.headless,
            sandbox: config.sandbox,
            executable: config.chrome_executable.clone(),
            timeout: config.load_timeout(),
        }
    }
}

/// One page inside a running renderer.
pub trait RendererSession {
    /// Fix the viewport to `width` × `height` CSS pixels.
    fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), RendererError>;

    /// Load `location` and wait for the load to complete.
    fn navigate(&mut self, location: &str) -> Result<(), RendererError>;

    /// Force `media` styles for the rest of the session.
    fn emulate_media(&mut self, media: MediaType) -> Result<(), RendererError>;

    /// Evaluate a JavaScript expression in the page. Expressions that produce
    /// nothing (`undefined`) come back as `Value::Null`.
    fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value, RendererError>;

    /// Suspend for `duration`. Blocks the calling thread.
    fn wait(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Encode the current viewport as a one-page PDF of exactly
    /// `width` × `height` CSS pixels, with backgrounds and no margins.
    fn encode_viewport_as_page(&mut self, width: u32, height: u32)
        -> Result<Vec<u8>, RendererError>;

    /// Release the renderer. Called exactly once, on every exit path.
    fn close(&mut self) -> Result<(), RendererError>;
}

/// Creates [`RendererSession`]s.
pub trait SessionLauncher {
    type Session: RendererSession;

    fn launch(&self, options: &SessionOptions) -> Result<Self::Session, RendererError>;
}
