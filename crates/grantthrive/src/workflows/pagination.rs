use serde::Serialize;

/// Page-size policy for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl ListingConfig {
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

/// One page of a filtered listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub pages: usize,
}

impl<T> Page<T> {
    /// Slices `rows` using offset pagination. `limit` must already be clamped.
    pub fn from_rows(rows: Vec<T>, skip: usize, limit: usize) -> Self {
        let total = rows.len();
        let items = rows.into_iter().skip(skip).take(limit).collect();
        Self {
            items,
            total,
            page: skip / limit + 1,
            per_page: limit,
            pages: total.div_ceil(limit),
        }
    }
}
