//! The deck-controller capability set, expressed as page scripts.
//!
//! The presentation framework running inside the page (reveal.js) exposes
//! slide counts and navigation on a global `Reveal` object. Each
//! [`DeckQuery`] renders to a single JavaScript expression that a
//! [`crate::session::RendererSession`] evaluates in the page. Expressions
//! evaluate to JSON-compatible values (booleans, numbers, or nothing).

use crate::model::SlideCoordinate;

/// One read or navigation request against the deck controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckQuery {
    /// Is a recognised deck controller present? Evaluates to a boolean and
    /// never throws.
    IsPresent,
    /// Total number of leaf slides, as the controller counts them.
    TotalSlides,
    /// Number of horizontal stacks.
    HorizontalSlides,
    /// Number of vertical sub-slides under one horizontal index.
    VerticalSlides(u32),
    /// Move the deck to a slide. Evaluates to nothing.
    GoTo(SlideCoordinate),
}

impl DeckQuery {
    /// The JavaScript expression for this query.
    pub fn script(&self) -> String {
        match self {
            DeckQuery::IsPresent => {
                "typeof Reveal !== 'undefined' && typeof Reveal.slide === 'function'".to_string()
            }
            DeckQuery::TotalSlides => "Reveal.getTotalSlides()".to_string(),
            DeckQuery::HorizontalSlides => "Reveal.getHorizontalSlides().length".to_string(),
            DeckQuery::VerticalSlides(h) => {
                format!("Reveal.getHorizontalSlides()[{h}].querySelectorAll('section').length")
            }
            DeckQuery::GoTo(c) => format!("Reveal.slide({}, {})", c.horizontal, c.vertical),
        }
    }
}
