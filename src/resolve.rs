use crate::error::{MixError, Result};
use crate::order::OrderToken;
use crate::source::{PageRef, PerSource};

/// An ordered page list where every entry is known to exist in its source.
///
/// Only [`resolve`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pages: Vec<PageRef>,
}

impl ResolvedSelection {
    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Consecutive pairs for two-up output; an odd last page has no partner
    pub fn pairs(&self) -> impl Iterator<Item = (PageRef, Option<PageRef>)> + '_ {
        self.pages
            .chunks(2)
            .map(|pair| (pair[0], pair.get(1).copied()))
    }
}

/// Check every candidate page against its document's page count.
///
/// Fails on the first missing page in candidate order; on success the
/// candidate is returned as-is.
pub fn resolve(candidate: Vec<PageRef>, page_counts: &PerSource<u32>) -> Result<ResolvedSelection> {
    if let Some(missing) = candidate
        .iter()
        .find(|r| r.page == 0 || r.page > page_counts[r.source])
    {
        return Err(MixError::PageMissing {
            pdf: missing.source,
            page: missing.page,
            available: page_counts[missing.source],
        });
    }
    Ok(ResolvedSelection { pages: candidate })
}

/// Check a span before expanding it, reporting the same page `resolve`
/// would report first for the expanded pages
pub fn check_token(token: &OrderToken, page_counts: &PerSource<u32>) -> Result<()> {
    let available = page_counts[token.source];
    let missing = if token.start == 0 || token.start > available {
        Some(token.start)
    } else if token.end > available {
        Some(available + 1)
    } else {
        None
    };
    match missing {
        Some(page) => Err(MixError::PageMissing {
            pdf: token.source,
            page,
            available,
        }),
        None => Ok(()),
    }
}
