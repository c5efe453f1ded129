//! Pagination math for the dataset viewer.

use serde_json::Value;

use crate::models::Row;

/// The fixed choices offered by the rows-per-page selector.
pub const ROWS_PER_PAGE: [usize; 4] = [25, 50, 100, 200];

/// 1-based page cursor over a dataset of known total size.
///
/// The total is passed into every method rather than stored: the tracked
/// dataset total can change underneath the pager (preview swapped for the
/// full fetch) and the pager must keep clamping against the live value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub per: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self { page: 1, per: 50 }
    }
}

impl Pager {
    pub fn total_pages(&self, total_rows: usize) -> usize {
        total_rows.div_ceil(self.per).max(1)
    }

    /// Half-open `[start, end)` row range of the current page.
    pub fn slice_bounds(&self, total_rows: usize) -> (usize, usize) {
        let start = (self.page - 1) * self.per;
        let end = (start + self.per).min(total_rows);
        (start.min(end), end)
    }

    /// Clamp to a valid page for the given total.
    pub fn goto(&mut self, page: usize, total_rows: usize) {
        self.page = page.clamp(1, self.total_pages(total_rows));
    }

    /// Switching page size resets to the first page. Values outside the
    /// fixed choice set are ignored.
    pub fn set_per(&mut self, per: usize) {
        if ROWS_PER_PAGE.contains(&per) {
            self.per = per;
            self.page = 1;
        }
    }

    pub fn at_first(&self) -> bool {
        self.page <= 1
    }

    pub fn at_last(&self, total_rows: usize) -> bool {
        self.page >= self.total_pages(total_rows)
    }
}

/// Cell text for the table. Missing values (and missing keys) render as
/// the empty string — never a literal "null".
pub fn cell_text(row: &Row, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slice_bounds_match_spec_formula() {
        let pager = Pager { page: 3, per: 25 };
        assert_eq!(pager.slice_bounds(1000), (50, 75));
        // Final partial page clips at the total.
        let pager = Pager { page: 5, per: 25 };
        assert_eq!(pager.slice_bounds(110), (100, 110));
    }

    #[test]
    fn slice_length_never_exceeds_page_size() {
        for per in ROWS_PER_PAGE {
            let total = 777;
            let mut pager = Pager { page: 1, per };
            for page in 1..=pager.total_pages(total) {
                pager.goto(page, total);
                let (start, end) = pager.slice_bounds(total);
                assert!(end - start <= per);
                assert_eq!(end, (start + per).min(total));
            }
        }
    }

    #[test]
    fn goto_clamps_to_valid_range() {
        let mut pager = Pager { page: 1, per: 50 };
        pager.goto(999, 120);
        assert_eq!(pager.page, 3);
        pager.goto(0, 120);
        assert_eq!(pager.page, 1);
    }

    #[test]
    fn set_per_resets_page_and_rejects_unknown_sizes() {
        let mut pager = Pager { page: 4, per: 50 };
        pager.set_per(200);
        assert_eq!(pager, Pager { page: 1, per: 200 });
        pager.goto(2, 1000);
        pager.set_per(33);
        assert_eq!(pager, Pager { page: 2, per: 200 });
    }

    #[test]
    fn empty_dataset_still_has_one_page() {
        let pager = Pager::default();
        assert_eq!(pager.total_pages(0), 1);
        assert_eq!(pager.slice_bounds(0), (0, 0));
        assert!(pager.at_first());
        assert!(pager.at_last(0));
    }

    #[test]
    fn missing_cells_render_empty() {
        let row: Row = serde_json::from_value(json!({"a": null, "b": "x", "c": 1.5})).unwrap();
        assert_eq!(cell_text(&row, "a"), "");
        assert_eq!(cell_text(&row, "absent"), "");
        assert_eq!(cell_text(&row, "b"), "x");
        assert_eq!(cell_text(&row, "c"), "1.5");
    }
}
