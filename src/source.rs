use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Which of the two input documents a page belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    A,
    B,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::A, Source::B];

    /// Parse a source tag, case-insensitively
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "A" | "a" => Some(Source::A),
            "B" | "b" => Some(Source::B),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::A => f.write_str("A"),
            Source::B => f.write_str("B"),
        }
    }
}

/// A 1-based page of one source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRef {
    pub source: Source,
    pub page: u32,
}

impl PageRef {
    pub fn new(source: Source, page: u32) -> Self {
        PageRef { source, page }
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.source, self.page)
    }
}

/// One value per source document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerSource<T> {
    pub a: T,
    pub b: T,
}

impl<T> PerSource<T> {
    pub fn new(a: T, b: T) -> Self {
        PerSource { a, b }
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, mut f: F) -> PerSource<U> {
        PerSource {
            a: f(&self.a),
            b: f(&self.b),
        }
    }
}

impl<T> Index<Source> for PerSource<T> {
    type Output = T;

    fn index(&self, source: Source) -> &T {
        match source {
            Source::A => &self.a,
            Source::B => &self.b,
        }
    }
}

impl<T> IndexMut<Source> for PerSource<T> {
    fn index_mut(&mut self, source: Source) -> &mut T {
        match source {
            Source::A => &mut self.a,
            Source::B => &mut self.b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Source::from_tag("a"), Some(Source::A));
        assert_eq!(Source::from_tag("B"), Some(Source::B));
        assert_eq!(Source::from_tag("C"), None);
        assert_eq!(Source::from_tag(""), None);
    }

    #[test]
    fn test_index_by_source() {
        let mut counts = PerSource::new(3u32, 7u32);
        assert_eq!(counts[Source::A], 3);
        assert_eq!(counts[Source::B], 7);
        counts[Source::B] = 9;
        assert_eq!(counts.b, 9);
    }

    #[test]
    fn test_page_ref_display() {
        assert_eq!(PageRef::new(Source::B, 12).to_string(), "B12");
    }
}
