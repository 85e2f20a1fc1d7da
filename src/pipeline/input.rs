//! Input resolution: turn a user-supplied path or URL into a location the
//! renderer can load.
//!
//! Local paths are checked *before* any renderer is launched, so a typo costs
//! nothing. They are made absolute and converted to `file://` URLs; the
//! renderer resolves relative assets (CSS, JS, images) against that URL.

use crate::error::ExportError;
use std::path::Path;
use tracing::debug;
use url::Url;

/// The resolved deck location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInput {
    /// A local file, as an absolute `file://` URL.
    Local(Url),
    /// A remote deck; loaded as-is.
    Remote(Url),
}

impl ResolvedInput {
    /// The URL handed to the renderer.
    pub fn location(&self) -> &str {
        match self {
            ResolvedInput::Local(url) => url.as_str(),
            ResolvedInput::Remote(url) => url.as_str(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a loadable location.
pub fn resolve_input(input: &str) -> Result<ResolvedInput, ExportError> {
    if is_url(input) {
        let url = Url::parse(input).map_err(|e| {
            ExportError::InvalidConfig(format!("Invalid input URL '{input}': {e}"))
        })?;
        debug!("Resolved remote deck: {}", url);
        return Ok(ResolvedInput::Remote(url));
    }
    resolve_local(Path::new(input))
}

fn resolve_local(path: &Path) -> Result<ResolvedInput, ExportError> {
    if !path.is_file() {
        return Err(ExportError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let absolute = std::fs::canonicalize(path).map_err(|_| ExportError::InputNotFound {
        path: path.to_path_buf(),
    })?;
    let url = Url::from_file_path(&absolute).map_err(|_| {
        ExportError::Internal(format!(
            "cannot express '{}' as a file URL",
            absolute.display()
        ))
    })?;

    debug!("Resolved local deck: {}", url);
    Ok(ResolvedInput::Local(url))
}
