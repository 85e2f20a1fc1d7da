//! Data model shared by the pipeline stages.

use crate::config::Resolution;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One leaf slide in a deck laid out as a horizontal stack of vertical stacks.
///
/// Ordering is lexicographic: `horizontal` first, then `vertical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlideCoordinate {
    pub horizontal: u32,
    pub vertical: u32,
}

impl SlideCoordinate {
    pub const fn new(horizontal: u32, vertical: u32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

impl fmt::Display for SlideCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(h:{}, v:{})", self.horizontal, self.vertical)
    }
}

/// The ordered traversal plan for one export run.
///
/// `reported_total` is what the deck controller claims; it is advisory and
/// only used for progress text. The coordinate list is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideManifest {
    reported_total: usize,
    coordinates: Vec<SlideCoordinate>,
}

impl SlideManifest {
    /// Build a manifest from the number of vertical slides under each
    /// horizontal index.
    ///
    /// A count of 0 or 1 yields the single coordinate `{h, 0}`; larger
    /// counts yield `{h, 0..k}` in increasing order.
    pub fn from_vertical_counts(vertical_counts: &[u32], reported_total: usize) -> Self {
        let coordinates = vertical_counts
            .iter()
            .enumerate()
            .flat_map(|(h, &count)| {
                (0..count.max(1)).map(move |v| SlideCoordinate::new(h as u32, v))
            })
            .collect();
        Self {
            reported_total,
            coordinates,
        }
    }

    pub fn coordinates(&self) -> &[SlideCoordinate] {
        &self.coordinates
    }

    pub fn reported_total(&self) -> usize {
        self.reported_total
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// `true` when the controller's reported total matches the enumeration.
    pub fn is_reconciled(&self) -> bool {
        self.reported_total == self.coordinates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlideCoordinate> {
        self.coordinates.iter()
    }
}

/// Pipeline controller state. Transitions are strictly linear; any failure
/// jumps straight to [`ExportStage::Closed`].
///
/// `Display` renders the activity performed while entering the stage, so an
/// error can say what the controller was doing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportStage {
    Idle,
    SessionOpened,
    DocumentLoaded,
    MediaEmulated,
    Enumerated,
    /// Capturing the slide at this 0-based manifest index.
    Capturing(usize),
    Assembling,
    Serialized,
    Closed,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::Idle => f.write_str("validating the request"),
            ExportStage::SessionOpened => f.write_str("launching the renderer"),
            ExportStage::DocumentLoaded => f.write_str("loading the document"),
            ExportStage::MediaEmulated => f.write_str("emulating screen media"),
            ExportStage::Enumerated => f.write_str("enumerating slides"),
            ExportStage::Capturing(i) => write!(f, "capturing slide {}", i + 1),
            ExportStage::Assembling => f.write_str("assembling the document"),
            ExportStage::Serialized => f.write_str("writing the document"),
            ExportStage::Closed => f.write_str("closing the renderer"),
        }
    }
}

/// Outcome of a successful export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub input: String,
    pub output: PathBuf,
    pub resolution: Resolution,
    /// Slide count claimed by the deck controller.
    pub reported_total: usize,
    /// Captured slides, in output page order.
    pub coordinates: Vec<SlideCoordinate>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl ExportSummary {
    pub fn page_count(&self) -> usize {
        self.coordinates.len()
    }
}
