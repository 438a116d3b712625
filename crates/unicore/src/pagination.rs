//! Slice-and-divide paging for long button lists

/// One page of a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 0-based, clamped to the last page
    pub page: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// Cuts `page` out of `items`; an empty list has one empty page
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.min(total_pages - 1);
    let start = page * per_page;
    let end = (start + per_page).min(items.len());
    Page {
        items: &items[start..end],
        page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_of_five() {
        let items: Vec<u32> = (1..=12).collect();
        let first = paginate(&items, 0, 5);
        assert_eq!(first.items, &[1, 2, 3, 4, 5]);
        assert_eq!(first.total_pages, 3);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = paginate(&items, 2, 5);
        assert_eq!(last.items, &[11, 12]);
        assert!(last.has_prev());
        assert!(!last.has_next());
    }

    #[test]
    fn test_page_past_end_is_clamped() {
        let items = [1, 2, 3];
        let page = paginate(&items, 9, 5);
        assert_eq!(page.page, 0);
        assert_eq!(page.items, &[1, 2, 3]);
    }

    #[test]
    fn test_empty_list() {
        let items: [u8; 0] = [];
        let page = paginate(&items, 0, 5);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
    }
}
