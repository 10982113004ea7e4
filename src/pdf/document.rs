use crate::error::{MixError, Result};
use crate::source::Source;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::fmt;
use std::path::Path;

/// An opened input PDF.
///
/// Page IDs are read once when the document is opened, so page count and
/// page lookup see the same document for the whole generation.
pub struct SourceDocument {
    pub doc: Document,
    pub path: String,
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let bytes = std::fs::read(&path).map_err(|e| MixError::UnreadableDocument {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;
        Self::load_mem(&bytes, path_str)
    }

    pub fn load_mem(bytes: &[u8], path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let doc = Document::load_mem(bytes).map_err(|e| MixError::UnreadableDocument {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_document(doc, path))
    }

    pub fn from_document(doc: Document, path: impl Into<String>) -> Self {
        // get_pages() is keyed by 1-based page number, so values come out in order
        let page_ids = doc.get_pages().into_values().collect();
        let source = SourceDocument {
            doc,
            path: path.into(),
            page_ids,
        };
        log::debug!("opened {} ({} pages)", source.path, source.page_count());
        source
    }

    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    /// Object ID of a 1-based page
    pub fn page_id(&self, source: Source, page: u32) -> Result<ObjectId> {
        page.checked_sub(1)
            .and_then(|idx| self.page_ids.get(idx as usize))
            .copied()
            .ok_or_else(|| MixError::PageMissing {
                pdf: source,
                page,
                available: self.page_count(),
            })
    }

    /// Page dictionary of a 1-based page
    pub fn page(&self, source: Source, page: u32) -> Result<(ObjectId, &Dictionary)> {
        let id = self.page_id(source, page)?;
        let dict = self
            .doc
            .get_dictionary(id)
            .map_err(|e| unreadable(source, page, e))?;
        Ok((id, dict))
    }

    /// Look up a page attribute, following the page tree for inherited ones
    pub fn inherited<'a>(&'a self, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        let mut node = page;
        // Bounded walk; a malformed tree may loop
        for _ in 0..32 {
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
            let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.producer = get_string_from_dict(dict, b"Producer");
            }
        }

        info.page_count = self.page_count();
        info
    }
}

impl fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDocument")
            .field("path", &self.path)
            .field("pages", &self.page_count())
            .finish_non_exhaustive()
    }
}

pub(crate) fn unreadable(source: Source, page: u32, err: impl std::fmt::Display) -> MixError {
    MixError::SourcePageUnreadable {
        pdf: source,
        page,
        reason: err.to_string(),
    }
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        // UTF-16 BE
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    } else {
        // PDFDocEncoding, approximated as Latin-1
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
