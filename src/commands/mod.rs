pub mod gallery;
pub mod info;
pub mod merge;

use crate::gallery::read_arrangement;
use crate::pdf::SourceDocument;
use crate::selection::{GenerationRequest, Layout, OrderInput, OrderMode};
use crate::source::PerSource;
use anyhow::{Context, Result};
use std::path::Path;

/// Open both inputs once for the whole request
pub fn open_documents<P: AsRef<Path>>(pdf_a: P, pdf_b: P) -> Result<PerSource<SourceDocument>> {
    Ok(PerSource::new(
        SourceDocument::open(pdf_a)?,
        SourceDocument::open(pdf_b)?,
    ))
}

/// Collect the raw user inputs into a request.
///
/// Supplying an arrangement file selects the interactive order mode; the
/// order string is still kept on the request.
pub fn build_request(
    pages_a: &str,
    pages_b: &str,
    order: &str,
    arrangement: Option<&Path>,
    layout: Layout,
) -> Result<GenerationRequest> {
    let mut order = OrderInput::manual(order);
    if let Some(path) = arrangement {
        let entries = read_arrangement(path)
            .with_context(|| format!("Failed to read arrangement: {}", path.display()))?;
        order.arrangement = Some(entries);
        order.set_mode(OrderMode::Interactive);
    }

    Ok(GenerationRequest {
        ranges: PerSource::new(pages_a.to_string(), pages_b.to_string()),
        order,
        layout,
    })
}
