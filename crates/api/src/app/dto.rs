use serde::Deserialize;

use catalog_products::{Page, ProductFilter};

/// Raw listing query. Every field is optional and kept as text so that a bad
/// `page` value degrades to the first page instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl ListProductsQuery {
    pub fn filter(&self) -> ProductFilter {
        ProductFilter::from_query(
            self.search.as_deref(),
            self.category.as_deref(),
            self.sort.as_deref(),
        )
    }

    pub fn page(&self) -> Page {
        Page::parse(self.page.as_deref())
    }
}
