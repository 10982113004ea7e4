use crate::error::{MixError, Result};
use crate::page_range::split_tokens;
use crate::source::{PageRef, Source};
use regex::Regex;
use std::sync::LazyLock;

static ORDER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ABab]):?(\d+)(?:-(\d+))?$").expect("order token pattern"));

/// One element of an explicit order, like "A3" or "B:5-7"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderToken {
    pub source: Source,
    pub start: u32,
    pub end: u32,
}

impl OrderToken {
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = || MixError::InvalidOrderToken {
            token: token.to_string(),
        };

        let caps = ORDER_TOKEN.captures(token).ok_or_else(invalid)?;
        let source = Source::from_tag(&caps[1]).ok_or_else(invalid)?;
        let start: u32 = caps[2].parse().map_err(|_| invalid())?;
        let end: u32 = match caps.get(3) {
            Some(end) => end.as_str().parse().map_err(|_| invalid())?,
            None => start,
        };

        // Order tokens describe a sequence, so a descending span is a typo,
        // not an empty selection
        if start > end {
            return Err(invalid());
        }

        Ok(OrderToken { source, start, end })
    }

    /// The pages this token stands for, in ascending order
    pub fn pages(&self) -> impl Iterator<Item = PageRef> + '_ {
        (self.start..=self.end).map(move |page| PageRef::new(self.source, page))
    }
}

/// An explicit page order, held as its tokens so spans stay compact until
/// they are checked against the documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOrder {
    tokens: Vec<OrderToken>,
}

impl PageOrder {
    pub fn tokens(&self) -> &[OrderToken] {
        &self.tokens
    }

    /// The (source, page) pairs in order, duplicates included
    pub fn pages(&self) -> impl Iterator<Item = PageRef> + '_ {
        self.tokens.iter().flat_map(OrderToken::pages)
    }
}

/// Parse a mixed order string like "A1-3,B5,A10".
///
/// Token order is kept exactly as written and duplicates are allowed; page
/// numbers are not checked against any document here.
pub fn parse_order(s: &str) -> Result<PageOrder> {
    let tokens = split_tokens(s)
        .map(OrderToken::parse)
        .collect::<Result<Vec<_>>>()?;
    log::debug!("order {:?} -> {} token(s)", s, tokens.len());
    Ok(PageOrder { tokens })
}
