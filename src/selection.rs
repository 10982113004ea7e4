//! Deciding the final page order for one generation request.
//!
//! A request carries both order representations, the typed order string and
//! the thumbnail arrangement, side by side. Neither is derived from the
//! other; the active mode only decides which one is read at generation time.

use crate::error::Result;
use crate::gallery::ThumbnailEntry;
use crate::order::parse_order;
use crate::page_range::parse_range;
use crate::resolve::{check_token, resolve, ResolvedSelection};
use crate::source::{PageRef, PerSource, Source};

/// How pages are laid out on output sheets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// One page per sheet
    #[default]
    Sequential,
    /// Two pages side by side per sheet
    #[value(name = "two-up", alias = "2up")]
    TwoUp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderMode {
    /// Use the typed order string
    #[default]
    Manual,
    /// Use the thumbnail arrangement
    Interactive,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderInput {
    pub mode: OrderMode,
    /// Last typed order string, e.g. "A1-3,B5,A10"
    pub manual: String,
    /// Last thumbnail arrangement, in the user's order
    pub arrangement: Option<Vec<ThumbnailEntry>>,
}

impl OrderInput {
    pub fn manual(order: impl Into<String>) -> Self {
        OrderInput {
            mode: OrderMode::Manual,
            manual: order.into(),
            arrangement: None,
        }
    }

    /// Switch the active mode. The other mode's data is left alone.
    pub fn set_mode(&mut self, mode: OrderMode) {
        self.mode = mode;
    }
}

/// Everything one generation needs besides the documents themselves
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    /// Range strings for A and B; blank selects nothing
    pub ranges: PerSource<String>,
    pub order: OrderInput,
    pub layout: Layout,
}

/// Where a candidate order came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOrigin {
    Arrangement,
    Manual,
    Default,
}

/// Build the candidate order.
///
/// An arrangement wins when the interactive mode is active, then a non-blank
/// order string, then all of A's range followed by all of B's range. Order
/// string spans are bounded by the page counts before they are expanded.
pub fn candidate(
    request: &GenerationRequest,
    page_counts: &PerSource<u32>,
) -> Result<(OrderOrigin, Vec<PageRef>)> {
    let order = &request.order;

    if order.mode == OrderMode::Interactive {
        if let Some(arrangement) = &order.arrangement {
            let pages = arrangement.iter().map(|entry| entry.page).collect();
            return Ok((OrderOrigin::Arrangement, pages));
        }
    }

    if !order.manual.trim().is_empty() {
        let manual = parse_order(&order.manual)?;
        for token in manual.tokens() {
            check_token(token, page_counts)?;
        }
        let pages = manual.pages().collect();
        return Ok((OrderOrigin::Manual, pages));
    }

    let mut pages = Vec::new();
    for source in Source::ALL {
        let range = parse_range(&request.ranges[source], Some(page_counts[source]))?;
        pages.extend(range.into_iter().map(|page| PageRef::new(source, page)));
    }
    Ok((OrderOrigin::Default, pages))
}

/// Decide and validate the final page order for a request
pub fn derive_selection(
    request: &GenerationRequest,
    page_counts: &PerSource<u32>,
) -> Result<ResolvedSelection> {
    let (origin, pages) = candidate(request, page_counts)?;
    log::info!("using {:?} order with {} page(s)", origin, pages.len());
    resolve(pages, page_counts)
}
