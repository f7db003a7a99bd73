//! Listing filters shared by the admin endpoints.

use launchpad_schema::CommitmentStatus;
use serde::Deserialize;

pub const DEFAULT_PER_PAGE: u32 = 50;
pub const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageQuery {
    /// Clamp to `page >= 1` and `1..=MAX_PER_PAGE`.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

#[derive(Debug, Clone, Default)]
pub struct WaitlistFilter {
    pub page: PageQuery,
    /// Substring match on email.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommitmentFilter {
    pub page: PageQuery,
    pub status: Option<CommitmentStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub page: PageQuery,
    pub event_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EmailLogFilter {
    pub page: PageQuery,
    pub template: Option<String>,
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern and wrap in wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_clamps_and_computes_offset() {
        let q = PageQuery {
            page: 0,
            per_page: 10_000,
        }
        .normalized();
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, MAX_PER_PAGE);
        assert_eq!(q.offset(), 0);

        let q = PageQuery {
            page: 3,
            per_page: 25,
        }
        .normalized();
        assert_eq!(q.offset(), 50);
        assert_eq!(q.limit(), 25);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("a_b%c"), r"%a\_b\%c%");
    }
}
