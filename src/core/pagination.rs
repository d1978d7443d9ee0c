use crate::domain::model::{Page, Property};

/// `ceil(total / page_size)`, 0 when there is nothing to show.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// 將使用者要求的頁碼限制在 [1, max(1, total_pages)]
pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1))
}

/// Half-open slice `[(page - 1) * size, min(page * size, len))`.
///
/// Page numbers are 1-based. A page past the end is not an error here; it
/// comes back empty with correct metadata.
pub fn paginate(items: &[Property], page_number: usize, page_size: usize) -> Page {
    let total_items = items.len();
    let total_pages = total_pages(total_items, page_size);

    let start = page_number
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(total_items);
    let end = page_number.saturating_mul(page_size).min(total_items);
    let slice = if page_number == 0 || start >= end {
        &[][..]
    } else {
        &items[start..end]
    };

    Page {
        items: slice.to_vec(),
        page_number,
        page_size,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listings(n: usize) -> Vec<Property> {
        (1..=n).map(|i| Property::new(i.to_string())).collect()
    }

    #[test]
    fn test_twenty_five_items_in_pages_of_ten() {
        let items = listings(25);

        let first = paginate(&items, 1, 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 25);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].id, "1");

        let third = paginate(&items, 3, 10);
        assert_eq!(third.items.len(), 5);
        assert_eq!(third.items[0].id, "21");
        assert!(!third.has_next());

        let fourth = paginate(&items, 4, 10);
        assert!(fourth.items.is_empty());
        assert_eq!(fourth.total_pages, 3);
    }

    #[test]
    fn test_empty_input_has_zero_pages() {
        let page = paginate(&[], 1, 10);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_degenerate_page_arguments() {
        let items = listings(3);
        assert!(paginate(&items, 0, 10).items.is_empty());
        assert!(paginate(&items, 1, 0).items.is_empty());
        assert_eq!(paginate(&items, 1, 0).total_pages, 0);
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(2, 3), 2);
        assert_eq!(clamp_page(9, 3), 3);
        assert_eq!(clamp_page(5, 0), 1);
    }
}
