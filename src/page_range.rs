use crate::error::{MixError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\s]+").expect("separator pattern"));

/// No PDF has more pages than it can hold indirect objects
pub const MAX_PAGES: u32 = 8_388_607;

static SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d*)-(\d*)$").expect("span pattern"));

/// Split a page expression on runs of commas, semicolons and whitespace,
/// dropping empty tokens
pub fn split_tokens(s: &str) -> impl Iterator<Item = &str> {
    SEPARATORS.split(s).filter(|token| !token.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRange {
    /// `all`
    All,
    /// `N`
    Single(u32),
    /// `N-M`, with N <= M
    Bounded(u32, u32),
    /// `-M`
    UpTo(u32),
    /// `N-`
    From(u32),
}

impl PageRange {
    /// Parse a single range token like "5", "1-5", "-5", "3-" or "all"
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = || MixError::InvalidRangeToken {
            token: token.to_string(),
        };

        if token.eq_ignore_ascii_case("all") {
            return Ok(PageRange::All);
        }

        if token.bytes().all(|b| b.is_ascii_digit()) && !token.is_empty() {
            return parse_number(token).map(PageRange::Single).ok_or_else(invalid);
        }

        let caps = SPAN.captures(token).ok_or_else(invalid)?;
        let start = &caps[1];
        let end = &caps[2];

        match (start.is_empty(), end.is_empty()) {
            (false, false) => {
                let start = parse_number(start).ok_or_else(invalid)?;
                let end = parse_number(end).ok_or_else(invalid)?;
                if start > end {
                    return Err(invalid());
                }
                Ok(PageRange::Bounded(start, end))
            }
            (true, false) => parse_number(end).map(PageRange::UpTo).ok_or_else(invalid),
            (false, true) => parse_number(start).map(PageRange::From).ok_or_else(invalid),
            (true, true) => Err(invalid()),
        }
    }

    /// Expand this range into 1-based page numbers.
    ///
    /// `total_pages` is `None` while no document is loaded; `all` and `N-`
    /// cannot be expanded then, and pages are only bounded by [`MAX_PAGES`].
    pub fn expand(&self, total_pages: Option<u32>, token: &str) -> Result<Vec<u32>> {
        let need_total = || {
            total_pages.ok_or_else(|| MixError::DocumentNotLoaded {
                token: token.to_string(),
            })
        };

        let (start, end) = match *self {
            PageRange::All => return Ok((1..=need_total()?).collect()),
            PageRange::Single(n) => (n, n),
            PageRange::Bounded(start, end) => (start, end),
            PageRange::UpTo(end) => (1, end),
            PageRange::From(start) => (start, need_total()?),
        };

        check_page(start, total_pages)?;
        check_page(end, total_pages)?;

        Ok((start..=end).collect())
    }
}

fn parse_number(s: &str) -> Option<u32> {
    s.parse::<u32>().ok()
}

fn check_page(page: u32, total_pages: Option<u32>) -> Result<()> {
    let too_high = page > total_pages.unwrap_or(MAX_PAGES);
    if page == 0 || too_high {
        return Err(MixError::PageOutOfBounds {
            page,
            total: total_pages,
        });
    }
    Ok(())
}

/// Parse a range string like "1,3-5;8", "all", "-5" or "3-" into sorted,
/// deduplicated 1-based page numbers.
///
/// A blank string selects no pages.
pub fn parse_range(s: &str, total_pages: Option<u32>) -> Result<Vec<u32>> {
    let mut pages = BTreeSet::new();
    for token in split_tokens(s) {
        let range = PageRange::parse(token)?;
        pages.extend(range.expand(total_pages, token)?);
    }
    let pages: Vec<u32> = pages.into_iter().collect();
    log::debug!("range {:?} -> {} page(s)", s, pages.len());
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        let range = PageRange::parse("5").unwrap();
        assert_eq!(range, PageRange::Single(5));
        assert_eq!(range.expand(Some(10), "5").unwrap(), vec![5]);
    }

    #[test]
    fn test_page_range() {
        assert_eq!(parse_range("1-5", Some(10)).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_open_ended() {
        assert_eq!(parse_range("8-", Some(10)).unwrap(), vec![8, 9, 10]);
        assert_eq!(parse_range("-3", Some(10)).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_all_keyword() {
        for n in 1..=6 {
            let expected: Vec<u32> = (1..=n).collect();
            assert_eq!(parse_range("all", Some(n)).unwrap(), expected);
        }
        assert_eq!(parse_range("ALL", Some(2)).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_all_without_document() {
        let err = parse_range("all", None).unwrap_err();
        assert!(matches!(err, MixError::DocumentNotLoaded { ref token } if token == "all"));

        let err = parse_range("3-", None).unwrap_err();
        assert!(matches!(err, MixError::DocumentNotLoaded { .. }));
    }

    #[test]
    fn test_bounded_without_document() {
        assert_eq!(parse_range("2-4,-2", None).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_huge_span_without_document() {
        let err = parse_range("1-4000000000", None).unwrap_err();
        assert!(matches!(
            err,
            MixError::PageOutOfBounds {
                page: 4000000000,
                total: None
            }
        ));
        assert_eq!(parse_range("8388607", None).unwrap(), vec![MAX_PAGES]);
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        let expected = vec![1, 2, 3];
        assert_eq!(parse_range("3,1,2", Some(5)).unwrap(), expected);
        assert_eq!(parse_range("1-3", Some(5)).unwrap(), expected);
        assert_eq!(parse_range("2-3 1-2 3", Some(5)).unwrap(), expected);
    }

    #[test]
    fn test_separators() {
        assert_eq!(
            parse_range(" 1 ,, 3;5\t7 ", Some(10)).unwrap(),
            vec![1, 3, 5, 7]
        );
        assert!(parse_range("", Some(10)).unwrap().is_empty());
        assert!(parse_range(" ,; ", None).unwrap().is_empty());
    }

    #[test]
    fn test_reverse_range_rejected() {
        let err = parse_range("2-1", Some(5)).unwrap_err();
        assert!(matches!(err, MixError::InvalidRangeToken { ref token } if token == "2-1"));
    }

    #[test]
    fn test_invalid_tokens() {
        for bad in ["x", "1-2-3", "-", "1.5", "A1", "99999999999"] {
            let err = parse_range(bad, Some(10)).unwrap_err();
            assert!(
                matches!(err, MixError::InvalidRangeToken { ref token } if token == bad),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_invalid_page_zero() {
        let err = parse_range("0", Some(10)).unwrap_err();
        assert!(matches!(err, MixError::PageOutOfBounds { page: 0, .. }));

        let err = parse_range("-0", None).unwrap_err();
        assert!(matches!(err, MixError::PageOutOfBounds { page: 0, total: None }));
    }

    #[test]
    fn test_page_exceeds_total() {
        let err = parse_range("15", Some(10)).unwrap_err();
        assert!(matches!(
            err,
            MixError::PageOutOfBounds {
                page: 15,
                total: Some(10)
            }
        ));

        let err = parse_range("4-12", Some(10)).unwrap_err();
        assert!(matches!(err, MixError::PageOutOfBounds { page: 12, .. }));
    }
}
