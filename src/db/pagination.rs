//! Page arithmetic for row listings and lyrics verses.

/// Page used when none (or an invalid one) is requested.
pub const DEFAULT_PAGE: usize = 1;
/// Page size used when none (or an invalid one) is requested.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Blank line separating two verses.
pub const VERSE_DELIMITER: &str = "\n\n";

const ESCAPED_VERSE_DELIMITER: &str = "\\n\\n";

/// Requested page, 1-based, with a page size of at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Zero values fall back to the defaults.
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: if page >= 1 { page } else { DEFAULT_PAGE },
            page_size: if page_size >= 1 {
                page_size
            } else {
                DEFAULT_PAGE_SIZE
            },
        }
    }

    /// Build from raw query parameters. Missing, unparsable or non-positive
    /// values fall back to the defaults.
    pub fn from_params(page: Option<&str>, page_size: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|n| *n >= 1)
                .map(|n| n as usize)
                .unwrap_or(0)
        };
        Self::new(parse(page), parse(page_size))
    }
}

/// A resolved window over a non-empty result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Clamped page; this is the page the row query must use.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub offset: usize,
}

impl PageWindow {
    /// Number of rows the window should hold for an unchanged dataset.
    pub fn expected_len(&self) -> usize {
        self.page_size.min(self.total_count - self.offset)
    }
}

/// Outcome of row pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPage {
    /// Nothing matched; no row query should be issued.
    Empty { page_size: usize },
    Window(PageWindow),
}

fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size)
}

/// Resolve a page request against a row count.
pub fn paginate_rows(total_count: usize, request: PageRequest) -> RowPage {
    let request = PageRequest::new(request.page, request.page_size);
    if total_count == 0 {
        return RowPage::Empty {
            page_size: request.page_size,
        };
    }

    let total_pages = total_pages(total_count, request.page_size);
    let page = request.page.min(total_pages);

    RowPage::Window(PageWindow {
        page,
        page_size: request.page_size,
        total_pages,
        total_count,
        offset: (page - 1) * request.page_size,
    })
}

/// One page of verses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersePage {
    pub verses: Vec<String>,
    /// Clamped page; 0 when the text has no verses.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Turn escaped blank-line sequences (`\n\n` as literal backslashes) into
/// real blank lines.
pub fn normalize_lyrics(text: &str) -> String {
    text.replace(ESCAPED_VERSE_DELIMITER, VERSE_DELIMITER)
}

/// Split lyrics into verses on blank lines. Empty text has no verses.
pub fn split_verses(text: &str) -> Vec<String> {
    let normalized = normalize_lyrics(text);
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized
        .split(VERSE_DELIMITER)
        .map(str::to_string)
        .collect()
}

/// Slice the verses of `text` into the requested page.
pub fn paginate_verses(text: &str, request: PageRequest) -> VersePage {
    let request = PageRequest::new(request.page, request.page_size);
    let mut verses = split_verses(text);
    let total_pages = total_pages(verses.len(), request.page_size);
    let page = request.page.min(total_pages);

    let start = page.saturating_sub(1) * request.page_size;
    let end = (page * request.page_size).min(verses.len());
    let verses = if start < end {
        verses.drain(start..end).collect()
    } else {
        Vec::new()
    };

    VersePage {
        verses,
        page,
        page_size: request.page_size,
        total_pages,
    }
}
