//! Headless Chrome renderer session over the DevTools protocol.
//!
//! Uses the `headless_chrome` crate, which is a blocking client: every call
//! here parks the current thread until Chrome answers. The pipeline runs on a
//! `spawn_blocking` thread for exactly this reason.

use super::{MediaType, RendererSession, SessionLauncher, SessionOptions};
use crate::error::RendererError;
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// CSS pixels per inch in Chrome's print pipeline.
const CSS_PX_PER_INCH: f64 = 96.0;

/// The browser drops its connection after this much silence; fixed delays
/// between calls must stay well under it.
const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Launches a local Chrome/Chromium per export run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self, options: &SessionOptions) -> Result<ChromeSession, RendererError> {
        let viewport = options.viewport;
        let launch_options = LaunchOptions::default_builder()
            .headless(options.headless)
            .sandbox(options.sandbox)
            .path(options.executable.clone())
            .window_size(Some((viewport.width(), viewport.height())))
            .idle_browser_timeout(options.timeout.max(MIN_IDLE_TIMEOUT))
            .build()
            .map_err(|e| RendererError::Launch(format!("invalid launch options: {e}")))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| RendererError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| RendererError::Launch(format!("failed to open tab: {e}")))?;
        tab.set_default_timeout(options.timeout);

        debug!(
            "Launched Chrome (headless={}, viewport={})",
            options.headless, viewport
        );

        Ok(ChromeSession {
            browser: Some(browser),
            tab,
            timeout: options.timeout,
        })
    }
}

/// A single Chrome tab owned by one export run.
pub struct ChromeSession {
    /// `None` once closed; dropping the browser terminates the process.
    browser: Option<Browser>,
    tab: Arc<Tab>,
    timeout: Duration,
}

impl ChromeSession {
    fn ensure_open(&self) -> Result<(), RendererError> {
        if self.browser.is_some() {
            Ok(())
        } else {
            Err(RendererError::Closed)
        }
    }
}

/// Wrap an expression so the page returns a JSON envelope: `{"ok": value}`
/// or `{"error": message}`. Exceptions thus surface as errors instead of an
/// opaque remote object.
fn envelope(expression: &str) -> String {
    format!(
        "(() => {{ try {{ const r = ({expression}); \
         return JSON.stringify({{ ok: r === undefined ? null : r }}); }} \
         catch (e) {{ return JSON.stringify({{ error: String(e) }}); }} }})()"
    )
}

fn open_envelope(raw: Option<Value>) -> Result<Value, RendererError> {
    let text = match raw {
        Some(Value::String(s)) => s,
        other => {
            return Err(RendererError::Evaluation(format!(
                "expected a JSON envelope, got {other:?}"
            )))
        }
    };
    let mut parsed: Value = serde_json::from_str(&text)
        .map_err(|e| RendererError::Evaluation(format!("malformed result: {e}")))?;
    if let Some(err) = parsed.get("error") {
        return Err(RendererError::Evaluation(
            err.as_str().unwrap_or("unknown error").to_string(),
        ));
    }
    Ok(parsed.get_mut("ok").map(Value::take).unwrap_or(Value::Null))
}

/// Device metrics pinning the layout viewport to `width` × `height` CSS
/// pixels at scale 1.
fn viewport_override(width: u32, height: u32) -> Emulation::SetDeviceMetricsOverride {
    Emulation::SetDeviceMetricsOverride {
        width,
        height,
        device_scale_factor: 1.0,
        mobile: false,
        scale: None,
        screen_width: Some(width),
        screen_height: Some(height),
        position_x: None,
        position_y: None,
        dont_set_visible_size: None,
        screen_orientation: None,
        viewport: None,
        display_feature: None,
        device_posture: None,
    }
}

impl RendererSession for ChromeSession {
    fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        self.ensure_open()?;
        // Window bounds include browser chrome when headed; override the
        // layout viewport itself.
        self.tab
            .call_method(viewport_override(width, height))
            .map_err(|e| RendererError::Launch(format!("failed to size viewport: {e}")))?;
        Ok(())
    }

    fn navigate(&mut self, location: &str) -> Result<(), RendererError> {
        self.ensure_open()?;
        self.tab
            .navigate_to(location)
            .map_err(|e| RendererError::Navigation(e.to_string()))?;
        self.tab.wait_until_navigated().map_err(|e| {
            let msg = e.to_string();
            if msg.to_lowercase().contains("timed out") {
                RendererError::Timeout(self.timeout.as_millis() as u64)
            } else {
                RendererError::Navigation(msg)
            }
        })?;
        Ok(())
    }

    fn emulate_media(&mut self, media: MediaType) -> Result<(), RendererError> {
        self.ensure_open()?;
        self.tab
            .call_method(Emulation::SetEmulatedMedia {
                media: Some(media.as_str().to_string()),
                features: None,
            })
            .map_err(|e| RendererError::Evaluation(format!("failed to emulate media: {e}")))?;
        Ok(())
    }

    fn evaluate(&mut self, expression: &str) -> Result<Value, RendererError> {
        self.ensure_open()?;
        let remote = self
            .tab
            .evaluate(&envelope(expression), false)
            .map_err(|e| RendererError::Evaluation(e.to_string()))?;
        open_envelope(remote.value)
    }

    fn encode_viewport_as_page(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RendererError> {
        self.ensure_open()?;
        let options = PrintToPdfOptions {
            landscape: Some(false),
            display_header_footer: Some(false),
            print_background: Some(true),
            scale: Some(1.0),
            paper_width: Some(f64::from(width) / CSS_PX_PER_INCH),
            paper_height: Some(f64::from(height) / CSS_PX_PER_INCH),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            margin_right: Some(0.0),
            page_ranges: Some("1".to_string()),
            prefer_css_page_size: Some(false),
            ..Default::default()
        };
        self.tab
            .print_to_pdf(Some(options))
            .map_err(|e| RendererError::Encoding(e.to_string()))
    }

    fn close(&mut self) -> Result<(), RendererError> {
        let Some(browser) = self.browser.take() else {
            return Err(RendererError::Closed);
        };
        let tab_result = self.tab.close(false);
        drop(browser);
        tab_result
            .map(|_| ())
            .map_err(|e| RendererError::Launch(format!("failed to close tab: {e}")))
    }
}
