use serde::{Deserialize, Serialize};

/// Query parameters shared by every list endpoint: `?page=1&limit=10`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    /// Clamp page to >= 1 and limit to 1..=100.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: &PageQuery) -> Self {
        Self {
            items,
            total,
            page: page.page,
            limit: page.limit,
            total_pages: total_pages(total, page.limit),
        }
    }
}

/// Ceiling division; an empty collection has zero pages.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total > 0 {
        (total + limit - 1) / limit
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(99, 10), 10);
        assert_eq!(total_pages(100, 10), 10);
    }

    #[test]
    fn normalized_clamps_out_of_range_values() {
        let q = PageQuery { page: 0, limit: 0 }.normalized();
        assert_eq!((q.page, q.limit), (1, 1));

        let q = PageQuery {
            page: -5,
            limit: 1000,
        }
        .normalized();
        assert_eq!((q.page, q.limit), (1, 100));
    }

    #[test]
    fn offset_starts_at_zero_for_first_page() {
        let q = PageQuery { page: 1, limit: 10 };
        assert_eq!(q.offset(), 0);
        let q = PageQuery { page: 3, limit: 25 };
        assert_eq!(q.offset(), 50);
    }

    #[test]
    fn page_response_carries_pagination_metadata() {
        let q = PageQuery { page: 2, limit: 10 };
        let resp = PageResponse::new(vec![1, 2, 3], 23, &q);
        assert_eq!(resp.total, 23);
        assert_eq!(resp.page, 2);
        assert_eq!(resp.limit, 10);
        assert_eq!(resp.total_pages, 3);
        assert_eq!(resp.items.len(), 3);
    }
}
