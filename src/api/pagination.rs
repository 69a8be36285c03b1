use serde::Serialize;

pub(crate) const PER_PAGE: i64 = 10;

#[derive(Debug, Serialize)]
pub(crate) struct PageResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) page: i64,
    pub(crate) per_page: i64,
    pub(crate) total_count: i64,
    pub(crate) total_pages: i64,
}

impl<T> PageResponse<T> {
    pub(crate) fn new(items: Vec<T>, page: i64, total_count: i64) -> Self {
        Self { items, page, per_page: PER_PAGE, total_count, total_pages: total_pages(total_count) }
    }
}

/// Pages are 1-based; anything below 1 is treated as the first page.
pub(crate) fn normalize_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

pub(crate) fn offset(page: i64) -> i64 {
    (page - 1).saturating_mul(PER_PAGE)
}

pub(crate) fn total_pages(total_count: i64) -> i64 {
    (total_count + PER_PAGE - 1) / PER_PAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math() {
        assert_eq!(normalize_page(None), 1);
        assert_eq!(normalize_page(Some(-3)), 1);
        assert_eq!(offset(3), 20);
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
    }
}
