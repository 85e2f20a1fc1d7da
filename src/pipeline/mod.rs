//! Pipeline stages for deck-to-PDF export.
//!
//! Each submodule implements exactly one step; [`crate::export`] sequences
//! them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ enumerate ──▶ capture ×N ──▶ assemble
//! (path/URL) (manifest)   (1-page PDFs)  (N-page PDF)
//! ```
//!
//! 1. [`input`]     validate the deck location before anything is launched
//! 2. [`enumerate`] query the deck controller for the ordered slide list
//! 3. [`capture`]   navigate to one slide, settle, encode it as a one-page
//!    document in a private temp file
//! 4. [`assemble`]  copy each captured page into the output document and
//!    write it atomically

pub mod assemble;
pub mod capture;
pub mod enumerate;
pub mod input;
