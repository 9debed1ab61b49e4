use serde::Serialize;

/// Zero-based page number plus page size. `size` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        debug_assert!(size > 0, "page size must be positive");
        Self { page, size }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Index range `[offset, offset + size)` clamped to `len`.
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.offset().min(len);
        let end = start.saturating_add(self.size).min(len);
        start..end
    }
}

/// One page of results.
///
/// There are three ways to build one and they report totals differently;
/// callers pick the constructor matching the query path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub number_of_elements: usize,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    /// Store pagination: `content` is already the requested window and
    /// `total` the size of the whole collection. An empty collection has
    /// zero pages.
    pub fn from_store(content: Vec<T>, request: PageRequest, total: usize) -> Self {
        let total_pages = total.div_ceil(request.size);
        Self::build(content, request.page, request.size, total, total_pages)
    }

    /// In-memory pagination over an already filtered list. An empty list
    /// still reports one (empty) page.
    pub fn slice(mut items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len();
        let window = request.window(total);
        let content: Vec<T> = items.drain(window).collect();
        let total_pages = if total == 0 { 1 } else { total.div_ceil(request.size) };
        Self::build(content, request.page, request.size, total, total_pages)
    }

    /// A single unnumbered page holding `content`, reporting `total` as the
    /// collection size. Page size is the content length.
    pub fn unpaged(content: Vec<T>, total: usize) -> Self {
        let size = content.len();
        Self::build(content, 0, size, total, 1)
    }

    pub fn empty_unpaged() -> Self {
        Self::unpaged(Vec::new(), 0)
    }

    fn build(content: Vec<T>, number: usize, size: usize, total: usize, total_pages: usize) -> Self {
        let number_of_elements = content.len();
        Self {
            empty: content.is_empty(),
            content,
            number,
            size,
            total_elements: total,
            total_pages,
            number_of_elements,
            first: number == 0,
            last: number.saturating_add(1) >= total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}
