//! List query state: page, page size, sort, search and named filters.
//!
//! Every mutation returns a new `QueryState`. All mutations except
//! [`QueryState::with_page`] reset the page to 1.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryError {
    #[error("page size must be one of 10, 25, 50, 100 (got {0})")]
    InvalidPageSize(u32),

    #[error("page must be >= 1")]
    InvalidPage,

    #[error("sort order must be `asc` or `desc` (got {0})")]
    InvalidSortOrder(String),
}

/// Page sizes offered by the list screens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PageSize {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
        PageSize::Hundred,
    ];

    #[must_use]
    pub fn get(self) -> u32 {
        match self {
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = QueryError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or(QueryError::InvalidPageSize(value))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(QueryError::InvalidSortOrder(other.to_string())),
        }
    }
}

/// Scalar filter value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Id(u64),
    Flag(bool),
    Text(String),
}

impl FilterValue {
    /// Query-string rendering. `None` means the filter is not sent:
    /// a `false` flag and blank text are equivalent to "no filter".
    #[must_use]
    pub fn to_param(&self) -> Option<String> {
        match self {
            FilterValue::Id(id) => Some(id.to_string()),
            FilterValue::Flag(true) => Some("true".to_string()),
            FilterValue::Flag(false) => None,
            FilterValue::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryState {
    page: u32,
    page_size: PageSize,
    sort_by: Option<String>,
    sort_order: SortOrder,
    search: String,
    filters: BTreeMap<String, FilterValue>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl QueryState {
    #[must_use]
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page: 1,
            page_size,
            sort_by: None,
            sort_order: SortOrder::Asc,
            search: String::new(),
            filters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    #[must_use]
    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&FilterValue> {
        self.filters.get(name)
    }

    #[must_use]
    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    #[must_use]
    pub fn with_filter(&self, name: impl Into<String>, value: FilterValue) -> Self {
        let mut next = self.first_page();
        next.filters.insert(name.into(), value);
        next
    }

    #[must_use]
    pub fn without_filter(&self, name: &str) -> Self {
        let mut next = self.first_page();
        next.filters.remove(name);
        next
    }

    #[must_use]
    pub fn with_search(&self, text: impl Into<String>) -> Self {
        let mut next = self.first_page();
        next.search = text.into();
        next
    }

    #[must_use]
    pub fn with_sort(&self, key: impl Into<String>) -> Self {
        let mut next = self.first_page();
        next.sort_by = Some(key.into());
        next
    }

    #[must_use]
    pub fn with_sort_order(&self, order: SortOrder) -> Self {
        let mut next = self.first_page();
        next.sort_order = order;
        next
    }

    #[must_use]
    pub fn with_page_size(&self, page_size: PageSize) -> Self {
        let mut next = self.first_page();
        next.page_size = page_size;
        next
    }

    /// The only mutation that keeps the rest of the state.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidPage` for page 0.
    pub fn with_page(&self, page: u32) -> Result<Self, QueryError> {
        if page == 0 {
            return Err(QueryError::InvalidPage);
        }
        let mut next = self.clone();
        next.page = page;
        Ok(next)
    }

    /// Query parameters for the paginated list endpoint, in a stable order.
    ///
    /// `sort_by`/`sort_order` are only sent when a sort key is set; search is
    /// sent trimmed and only when non-blank.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.get().to_string()),
        ];
        if let Some(sort_by) = &self.sort_by {
            params.push(("sort_by".to_string(), sort_by.clone()));
            params.push(("sort_order".to_string(), self.sort_order.to_string()));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search".to_string(), search.to_string()));
        }
        for (name, value) in &self.filters {
            if let Some(param) = value.to_param() {
                params.push((name.clone(), param));
            }
        }
        params
    }

    fn first_page(&self) -> Self {
        let mut next = self.clone();
        next.page = 1;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn page_size_accepts_only_enumerated_values() {
        assert_eq!(PageSize::try_from(25), Ok(PageSize::TwentyFive));
        assert_eq!(PageSize::try_from(30), Err(QueryError::InvalidPageSize(30)));
    }

    #[test]
    fn page_zero_is_rejected() {
        assert_eq!(QueryState::default().with_page(0), Err(QueryError::InvalidPage));
    }

    #[test]
    fn with_page_keeps_filters() {
        let query = QueryState::default()
            .with_filter("category_level_id", FilterValue::Id(3))
            .with_page(4)
            .unwrap();
        assert_eq!(query.page(), 4);
        assert_eq!(query.filter("category_level_id"), Some(&FilterValue::Id(3)));
    }

    #[test]
    fn params_follow_list_grammar() {
        let query = QueryState::new(PageSize::TwentyFive)
            .with_sort("last_name")
            .with_sort_order(SortOrder::Desc)
            .with_search("  Ivanov ")
            .with_filter("category_level_id", FilterValue::Id(2))
            .with_filter("only_without_sch", FilterValue::Flag(true))
            .with_page(3)
            .unwrap();

        let params = query.to_params();
        let expected: Vec<(String, String)> = [
            ("page", "3"),
            ("page_size", "25"),
            ("sort_by", "last_name"),
            ("sort_order", "desc"),
            ("search", "Ivanov"),
            ("category_level_id", "2"),
            ("only_without_sch", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn false_flags_and_blank_search_are_omitted() {
        let query = QueryState::default()
            .with_search("   ")
            .with_filter("only_without_sch", FilterValue::Flag(false));
        let names: Vec<String> = query.to_params().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["page".to_string(), "page_size".to_string()]);
    }

    #[derive(Clone, Debug)]
    enum Mutation {
        Filter(String, u64),
        Unfilter(String),
        Search(String),
        Sort(String),
        Order(bool),
        Size(usize),
    }

    fn arb_mutation() -> impl Strategy<Value = Mutation> {
        prop_oneof![
            ("[a-z_]{1,12}", any::<u64>()).prop_map(|(n, v)| Mutation::Filter(n, v)),
            "[a-z_]{1,12}".prop_map(Mutation::Unfilter),
            ".{0,16}".prop_map(Mutation::Search),
            "[a-z_]{1,12}".prop_map(Mutation::Sort),
            any::<bool>().prop_map(Mutation::Order),
            (0usize..4).prop_map(Mutation::Size),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_every_non_page_mutation_returns_to_first_page(
            start_page in 1u32..500,
            mutation in arb_mutation(),
        ) {
            let query = QueryState::default().with_page(start_page).unwrap();
            let next = match mutation {
                Mutation::Filter(name, value) => query.with_filter(name, FilterValue::Id(value)),
                Mutation::Unfilter(name) => query.without_filter(&name),
                Mutation::Search(text) => query.with_search(text),
                Mutation::Sort(key) => query.with_sort(key),
                Mutation::Order(desc) => query.with_sort_order(if desc { SortOrder::Desc } else { SortOrder::Asc }),
                Mutation::Size(idx) => query.with_page_size(PageSize::ALL[idx]),
            };
            prop_assert_eq!(next.page(), 1);
        }

        #[test]
        fn prop_with_page_only_changes_page(page in 1u32..10_000) {
            let query = QueryState::default()
                .with_sort("username")
                .with_search("abc");
            let next = query.with_page(page).unwrap();
            prop_assert_eq!(next.page(), page);
            prop_assert_eq!(next.with_page(1).unwrap(), query);
        }
    }
}
