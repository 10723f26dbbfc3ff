use admin_core::query::QueryState;

use crate::catalog::ListMode;

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

/// Pagination affordances.
///
/// There is no total count: "next" is offered whenever the last page came
/// back full, so a final page with exactly `page_size` rows shows an
/// enabled "next" that leads to an empty page once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationVm {
    pub page: u32,
    pub page_size: u32,
    pub can_prev: bool,
    pub can_next: bool,
}

impl PaginationVm {
    #[must_use]
    pub fn new(mode: ListMode, query: &QueryState, rows: usize) -> Self {
        let page_size = query.page_size().get();
        match mode {
            ListMode::Paginated => Self {
                page: query.page(),
                page_size,
                can_prev: query.page() > 1,
                can_next: u32::try_from(rows).is_ok_and(|rows| rows == page_size),
            },
            ListMode::Full => Self {
                page: 1,
                page_size,
                can_prev: false,
                can_next: false,
            },
        }
    }
}

/// What a list screen renders.
#[derive(Clone, Debug, PartialEq)]
pub struct ListView<T> {
    pub rows: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// Query the displayed rows were fetched with.
    pub shown_query: Option<QueryState>,
    pub pagination: PaginationVm,
}

impl<T: Clone> ListView<T> {
    #[must_use]
    pub fn state(&self) -> ViewState<Vec<T>> {
        match (&self.shown_query, &self.error) {
            (Some(_), _) => ViewState::Ready(self.rows.clone()),
            (None, Some(err)) if !self.loading => ViewState::Error(err.clone()),
            (None, _) if self.loading => ViewState::Loading,
            (None, _) => ViewState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_follows_full_page_rule() {
        let query = QueryState::default();
        assert!(PaginationVm::new(ListMode::Paginated, &query, 10).can_next);
        assert!(!PaginationVm::new(ListMode::Paginated, &query, 7).can_next);
        assert!(!PaginationVm::new(ListMode::Paginated, &query, 10).can_prev);

        let second = query.with_page(2).unwrap();
        assert!(PaginationVm::new(ListMode::Paginated, &second, 0).can_prev);
    }

    #[test]
    fn full_lists_have_no_pagination() {
        let vm = PaginationVm::new(ListMode::Full, &QueryState::default(), 10);
        assert!(!vm.can_next);
        assert!(!vm.can_prev);
    }

    #[test]
    fn last_good_rows_stay_ready_after_error() {
        let view = ListView {
            rows: vec![1, 2],
            loading: false,
            error: Some("Something went wrong. Please try again.".to_string()),
            shown_query: Some(QueryState::default()),
            pagination: PaginationVm::new(ListMode::Paginated, &QueryState::default(), 2),
        };
        assert_eq!(view.state(), ViewState::Ready(vec![1, 2]));

        let never_loaded = ListView::<u8> {
            rows: Vec::new(),
            loading: false,
            error: Some("boom".to_string()),
            shown_query: None,
            pagination: view.pagination,
        };
        assert_eq!(never_loaded.state(), ViewState::Error("boom".to_string()));
    }
}
