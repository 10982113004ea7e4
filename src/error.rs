use crate::page_range::MAX_PAGES;
use crate::source::Source;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MixError {
    #[error("Invalid page range token '{token}'")]
    InvalidRangeToken { token: String },

    #[error("Page {page} is out of range ({})", describe_bound(.total))]
    PageOutOfBounds { page: u32, total: Option<u32> },

    #[error("Invalid order token '{token}'. Use e.g. A1 or B5-7")]
    InvalidOrderToken { token: String },

    #[error("Page {page} missing in PDF {pdf} ({available} page(s) available)")]
    PageMissing {
        pdf: Source,
        page: u32,
        available: u32,
    },

    #[error("Page {page} of PDF {pdf} could not be read: {reason}")]
    SourcePageUnreadable {
        pdf: Source,
        page: u32,
        reason: String,
    },

    #[error("Failed to open PDF {path}: {reason}")]
    UnreadableDocument { path: String, reason: String },

    #[error("'{token}' needs the page count, but no document is loaded")]
    DocumentNotLoaded { token: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MixError>;

fn describe_bound(total: &Option<u32>) -> String {
    match total {
        Some(total) => format!("1-{}", total),
        None => format!("1-{} with no document loaded", MAX_PAGES),
    }
}
