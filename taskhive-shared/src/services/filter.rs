/// Query filtering, sorting and pagination
///
/// Listing endpoints accept user-supplied filter, sort and pagination
/// parameters. Everything that ends up interpolated into SQL text goes
/// through an allow-list here; only values travel through bind parameters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{TaskPriority, TaskStatus};

/// Default page size for listings
pub const DEFAULT_PER_PAGE: i64 = 15;

/// Upper bound on page size
pub const MAX_PER_PAGE: i64 = 100;

/// Columns tasks may be sorted by
pub const TASK_SORT_COLUMNS: &[&str] = &[
    "created_at",
    "updated_at",
    "due_date",
    "priority",
    "status",
    "title",
];

/// Columns teams may be sorted by
pub const TEAM_SORT_COLUMNS: &[&str] = &["created_at", "updated_at", "name"];

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Resolves a requested sort column against an allow-list
///
/// Unknown or absent columns fall back to `created_at`; the request value
/// never reaches the SQL text directly.
pub fn resolve_sort_column<'a>(requested: Option<&'a str>, allowed: &[&'a str]) -> &'a str {
    match requested {
        Some(col) if allowed.contains(&col) => col,
        _ => "created_at",
    }
}

/// Pagination parameters, normalised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    /// Normalises raw request values: page floors at 1, per_page defaults
    /// to 15 and is clamped to 1..=100.
    pub fn from_request(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// One page of results plus paging metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + pagination.per_page - 1) / pagination.per_page
        };

        Self {
            data,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages,
        }
    }
}

/// Task listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,

    /// Case-insensitive search against title and description
    pub search: Option<String>,

    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl TaskFilter {
    /// The sort column, constrained to the allow-list
    pub fn sort_column(&self) -> &str {
        resolve_sort_column(self.sort_by.as_deref(), TASK_SORT_COLUMNS)
    }

    /// Sort direction, defaulting to descending
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or(SortOrder::Desc)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::from_request(self.page, self.per_page)
    }
}

/// Team listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamFilter {
    pub is_active: Option<bool>,
    pub owner_id: Option<Uuid>,

    /// Case-insensitive search against name and description
    pub search: Option<String>,

    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl TeamFilter {
    pub fn sort_column(&self) -> &str {
        resolve_sort_column(self.sort_by.as_deref(), TEAM_SORT_COLUMNS)
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or(SortOrder::Desc)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::from_request(self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_allow_list() {
        for col in TASK_SORT_COLUMNS {
            assert_eq!(resolve_sort_column(Some(col), TASK_SORT_COLUMNS), *col);
        }

        // Unknown columns never reach the SQL text
        assert_eq!(
            resolve_sort_column(Some("id; DROP TABLE tasks"), TASK_SORT_COLUMNS),
            "created_at"
        );
        assert_eq!(
            resolve_sort_column(Some("owner_id"), TASK_SORT_COLUMNS),
            "created_at"
        );
        assert_eq!(resolve_sort_column(None, TASK_SORT_COLUMNS), "created_at");
    }

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let p = Pagination::from_request(None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, DEFAULT_PER_PAGE);
        assert_eq!(p.offset(), 0);

        let p = Pagination::from_request(Some(0), Some(0));
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 1);

        let p = Pagination::from_request(Some(-3), Some(100_000));
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, MAX_PER_PAGE);

        let p = Pagination::from_request(Some(3), Some(20));
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn test_page_metadata() {
        let pagination = Pagination::from_request(Some(2), Some(15));
        let page = Page::new(vec![1, 2, 3], 31, pagination);

        assert_eq!(page.total, 31);
        assert_eq!(page.page, 2);
        assert_eq!(page.per_page, 15);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], 0, pagination);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_task_filter_defaults() {
        let filter = TaskFilter::default();
        assert_eq!(filter.sort_column(), "created_at");
        assert_eq!(filter.sort_order(), SortOrder::Desc);
        assert_eq!(filter.pagination().per_page, DEFAULT_PER_PAGE);
    }
}
