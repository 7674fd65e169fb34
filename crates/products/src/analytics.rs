//! Derived catalog views.
//!
//! Every view is a pure function over the full product sequence, so the same code
//! serves every storage backend and can be tested without one. Input order is the
//! storage natural order; groupings keep first-seen order among equal counts.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use catalog_core::UserId;

use crate::product::Product;
use crate::views::BrandName;

/// Minimum average rating for the top-rated view (inclusive).
pub const TOP_RATED_MIN_RATING: f64 = 4.0;

/// Minimum review count for the top-rated view (inclusive).
pub const TOP_RATED_MIN_REVIEWS: u32 = 4;

/// Catalog size above which recommendations use the large sample.
pub const RECOMMENDATION_THRESHOLD: usize = 30;
pub const RECOMMENDATION_LARGE_SAMPLE: usize = 20;
pub const RECOMMENDATION_SMALL_SAMPLE: usize = 7;

/// Products with `average_rating >= 4` and `number_of_reviews >= 4`.
pub fn top_rated(products: &[Product]) -> Vec<Product> {
    products
        .iter()
        .filter(|p| {
            p.average_rating >= TOP_RATED_MIN_RATING && p.number_of_reviews >= TOP_RATED_MIN_REVIEWS
        })
        .cloned()
        .collect()
}

/// Number of products carried by one brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandCount {
    pub brand: String,
    pub count: u64,
}

/// Brands ordered by product count, descending.
pub fn brand_counts(products: &[Product]) -> Vec<BrandCount> {
    count_by(products, |p| p.brand.clone())
        .into_iter()
        .map(|(brand, count)| BrandCount { brand, count })
        .collect()
}

/// Brand names only, in [`brand_counts`] order.
pub fn top_brands(products: &[Product]) -> Vec<BrandName> {
    brand_counts(products)
        .into_iter()
        .map(|b| BrandName { brand_name: b.brand })
        .collect()
}

/// Number of products owned by one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorCount {
    pub vendor: UserId,
    pub product_count: u64,
}

/// Vendors ordered by product count, descending.
pub fn vendor_counts(products: &[Product]) -> Vec<VendorCount> {
    count_by(products, |p| p.vendor)
        .into_iter()
        .map(|(vendor, product_count)| VendorCount { vendor, product_count })
        .collect()
}

fn count_by<K, F>(products: &[Product], key: F) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    F: Fn(&Product) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, u64)> = Vec::new();

    for product in products {
        let k = key(product);
        match slots.get(&k) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slots.insert(k.clone(), counts.len());
                counts.push((k, 1));
            }
        }
    }

    // Stable: equal counts keep first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Calendar coordinates of a creation timestamp (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CalendarBucket {
    pub year: i32,
    pub month: u32,
    pub week: u32,
}

impl CalendarBucket {
    pub fn of(ts: DateTime<Utc>) -> Self {
        let date = ts.date_naive();
        Self {
            year: date.year(),
            month: date.month(),
            week: sunday_week_of_year(date),
        }
    }

    /// New-arrival ordering key: week, then month, then year.
    fn arrival_key(&self) -> (u32, u32, i32) {
        (self.week, self.month, self.year)
    }
}

/// Sunday-based week of the year in `0..=53`.
///
/// Week 1 starts on the first Sunday of the year; earlier days are week 0
/// (strftime `%U`).
pub fn sunday_week_of_year(date: NaiveDate) -> u32 {
    (date.ordinal0() + 7 - date.weekday().num_days_from_sunday()) / 7
}

/// Products sharing the calendar bucket of the first record when the catalog is
/// ordered by `(week, month, year)` descending.
///
/// Week dominates the ordering, so a late-December product outranks an early-January
/// one from the following year.
pub fn new_arrivals(products: &[Product]) -> Vec<Product> {
    let mut keyed: Vec<(CalendarBucket, &Product)> = products
        .iter()
        .map(|p| (CalendarBucket::of(p.created_at), p))
        .collect();
    keyed.sort_by(|a, b| b.0.arrival_key().cmp(&a.0.arrival_key()));

    let Some(&(bucket, _)) = keyed.first() else {
        return Vec::new();
    };

    keyed
        .into_iter()
        .take_while(|(b, _)| *b == bucket)
        .map(|(_, p)| p.clone())
        .collect()
}

/// Target sample size for a catalog of `total` products.
pub fn recommendation_size(total: usize) -> usize {
    if total > RECOMMENDATION_THRESHOLD {
        RECOMMENDATION_LARGE_SAMPLE
    } else {
        RECOMMENDATION_SMALL_SAMPLE
    }
}

/// Uniform sample without replacement, capped at the catalog size.
pub fn recommended<R: Rng + ?Sized>(products: &[Product], rng: &mut R) -> Vec<Product> {
    let size = recommendation_size(products.len()).min(products.len());
    products.choose_multiple(rng, size).cloned().collect()
}
