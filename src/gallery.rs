//! Page previews and the arrangement file built from them.
//!
//! A gallery lists the selected pages with a short preview each. Written out
//! as JSON it can be reordered, trimmed or extended by hand and fed back as
//! the interactive order.

use crate::error::Result;
use crate::pdf::SourceDocument;
use crate::resolve::ResolvedSelection;
use crate::source::{PageRef, PerSource, Source};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailEntry {
    #[serde(flatten)]
    pub page: PageRef,
    /// `None` when no preview could be made
    #[serde(default)]
    pub preview: Option<String>,
}

/// Produces a preview for one page
pub trait PreviewRenderer {
    fn render(&mut self, source: Source, document: &SourceDocument, page: u32)
        -> anyhow::Result<String>;
}

/// Previews pages as a short excerpt of their text
pub struct TextPreview {
    max_chars: usize,
    pages: HashMap<Source, Option<Vec<String>>>,
}

impl TextPreview {
    pub fn new(max_chars: usize) -> Self {
        TextPreview {
            max_chars,
            pages: HashMap::new(),
        }
    }

    fn page_texts(&mut self, source: Source, document: &SourceDocument) -> Option<&Vec<String>> {
        self.pages
            .entry(source)
            .or_insert_with(|| match extract_page_texts(document) {
                Ok(texts) => Some(texts),
                Err(e) => {
                    log::warn!("no text previews for {}: {:#}", document.path, e);
                    None
                }
            })
            .as_ref()
    }
}

impl Default for TextPreview {
    fn default() -> Self {
        TextPreview::new(80)
    }
}

impl PreviewRenderer for TextPreview {
    fn render(
        &mut self,
        source: Source,
        document: &SourceDocument,
        page: u32,
    ) -> anyhow::Result<String> {
        let max_chars = self.max_chars;
        let texts = self
            .page_texts(source, document)
            .ok_or_else(|| anyhow!("text extraction failed"))?;
        let text = page
            .checked_sub(1)
            .and_then(|idx| texts.get(idx as usize))
            .ok_or_else(|| anyhow!("no text for page {}", page))?;
        excerpt(text, max_chars).ok_or_else(|| anyhow!("page {} has no text", page))
    }
}

fn extract_page_texts(document: &SourceDocument) -> anyhow::Result<Vec<String>> {
    // pdf-extract parses on its own, so hand it the serialized document
    let mut bytes = Vec::new();
    document
        .doc
        .clone()
        .save_to(&mut bytes)
        .context("Failed to serialize PDF")?;
    // pdf-extract can panic on malformed fonts
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .map_err(|_| anyhow!("text extraction panicked"))?;
    extracted.with_context(|| format!("Failed to extract text from PDF: {}", document.path))
}

/// Collapse whitespace and cut to `max_chars`
fn excerpt(text: &str, max_chars: usize) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let joined = words.join(" ");
    if joined.chars().count() <= max_chars {
        return Some(joined);
    }
    let mut cut: String = joined.chars().take(max_chars).collect();
    cut.push_str("...");
    Some(cut)
}

/// One entry per selected page, in selection order.
///
/// Preview failures leave that entry without a preview.
pub fn build_gallery(
    selection: &ResolvedSelection,
    documents: &PerSource<SourceDocument>,
    renderer: &mut dyn PreviewRenderer,
) -> Vec<ThumbnailEntry> {
    selection
        .pages()
        .iter()
        .map(|&page| {
            let preview = match renderer.render(page.source, &documents[page.source], page.page) {
                Ok(preview) => Some(preview),
                Err(e) => {
                    log::warn!("no preview for {}: {:#}", page, e);
                    None
                }
            };
            ThumbnailEntry { page, preview }
        })
        .collect()
}

pub fn write_arrangement<W: Write>(entries: &[ThumbnailEntry], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, entries)?;
    Ok(())
}

pub fn read_arrangement<P: AsRef<Path>>(path: P) -> Result<Vec<ThumbnailEntry>> {
    let text = std::fs::read_to_string(path)?;
    let entries = serde_json::from_str(&text)?;
    Ok(entries)
}
