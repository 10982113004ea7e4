pub mod assemble;
pub mod document;

pub use assemble::{generate, save};
pub use document::SourceDocument;
