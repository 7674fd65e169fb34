//! Listing criteria: free-text search, category filter, sort mode and pagination.
//!
//! Storage backends translate [`ProductFilter`] into their own query language; the
//! in-memory backend uses [`select_page`] directly.

use crate::product::Product;

/// Fixed number of products per listing page.
pub const PAGE_SIZE: usize = 7;

/// Creation-time ordering requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first.
    Latest,
    /// Oldest first.
    Oldest,
}

impl SortOrder {
    /// Unknown values yield `None` (storage natural order).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "latest" => Some(Self::Latest),
            "oldest" => Some(Self::Oldest),
            _ => None,
        }
    }
}

/// Filter criteria for product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive literal substring of the product name.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    pub sort: Option<SortOrder>,
}

impl ProductFilter {
    /// Build criteria from raw query-string values. Empty strings count as absent.
    pub fn from_query(search: Option<&str>, category: Option<&str>, sort: Option<&str>) -> Self {
        Self {
            search: non_empty(search),
            category: non_empty(category),
            sort: sort.and_then(SortOrder::parse),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(search) = &self.search {
            if !product.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        true
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty()).map(str::to_string)
}

/// 1-indexed page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(u32);

impl Page {
    /// Page numbers below 1 are treated as the first page.
    pub fn new(number: u32) -> Self {
        Self(number.max(1))
    }

    /// Parse a raw `page` query value; anything non-numeric falls back to page 1.
    pub fn parse(raw: Option<&str>) -> Self {
        let number = raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(1);
        Self::new(number)
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    /// Number of records to skip: `(page - 1) * PAGE_SIZE`.
    pub fn offset(&self) -> usize {
        (self.0 as usize - 1).saturating_mul(PAGE_SIZE)
    }

    pub fn limit(&self) -> usize {
        PAGE_SIZE
    }
}

impl Default for Page {
    fn default() -> Self {
        Self(1)
    }
}

/// Filter, order and paginate an in-memory product sequence.
///
/// Without a sort mode the input order is preserved (natural order).
pub fn select_page(products: &[Product], filter: &ProductFilter, page: Page) -> Vec<Product> {
    let mut matching: Vec<&Product> = products.iter().filter(|p| filter.matches(p)).collect();

    match filter.sort {
        Some(SortOrder::Latest) => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Some(SortOrder::Oldest) => matching.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        None => {}
    }

    matching
        .into_iter()
        .skip(page.offset())
        .take(page.limit())
        .cloned()
        .collect()
}
