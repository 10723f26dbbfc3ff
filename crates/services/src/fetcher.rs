use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use admin_core::query::QueryState;
use api::{ApiClient, ApiError};

use crate::catalog::{ListMode, Resource};
use crate::notify::{Notification, Notifier};
use crate::sequence::SequenceGate;
use crate::view::{ListView, PaginationVm};

/// Rows of one successful fetch and the query that produced them.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourcePage<T> {
    pub items: Vec<T>,
    pub query: QueryState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { rows: usize },
    /// A newer request was issued before this one resolved; its result was
    /// dropped.
    Superseded,
}

struct ListState<T> {
    query: QueryState,
    page: Option<ResourcePage<T>>,
    loading: bool,
    error: Option<String>,
}

/// Issues list requests for one resource and keeps the last good page.
///
/// Handles are cheap to clone and share state.
pub struct ResourceFetcher<R: Resource> {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    gate: Arc<SequenceGate>,
    state: Arc<Mutex<ListState<R::Row>>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            notifier: Arc::clone(&self.notifier),
            gate: Arc::clone(&self.gate),
            state: Arc::clone(&self.state),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceFetcher<R> {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>, query: QueryState) -> Self {
        Self {
            api,
            notifier,
            gate: Arc::new(SequenceGate::new()),
            state: Arc::new(Mutex::new(ListState {
                query,
                page: None,
                loading: false,
                error: None,
            })),
            _resource: PhantomData,
        }
    }

    /// The most recently requested query.
    #[must_use]
    pub fn query(&self) -> QueryState {
        self.lock().query.clone()
    }

    /// Fetch the page for `query`.
    ///
    /// Only the latest issued request is applied; an older one resolving
    /// late returns `FetchOutcome::Superseded` and changes nothing. A failed
    /// latest request keeps the previous rows, clears the loading flag and
    /// notifies.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` of the latest request when it fails.
    pub async fn fetch_page(&self, query: QueryState) -> Result<FetchOutcome, ApiError> {
        let config = R::config();
        let ticket = self.gate.issue();
        {
            let mut state = self.lock();
            state.query = query.clone();
            state.loading = true;
        }
        debug!(resource = config.name, seq = ticket.value(), page = query.page(), "fetching page");

        let result = match config.list {
            ListMode::Paginated => {
                self.api
                    .list_page::<R::Row>(config.name, query.to_params())
                    .await
            }
            ListMode::Full => self.api.list_all::<R::Row>(config.name).await,
        };

        let applied = self.gate.settle(ticket, || {
            let mut state = self.lock();
            state.loading = false;
            match result {
                Ok(items) => {
                    let rows = items.len();
                    state.page = Some(ResourcePage { items, query });
                    state.error = None;
                    Ok(rows)
                }
                Err(err) => {
                    state.error = Some(err.user_message());
                    Err(err)
                }
            }
        });

        match applied {
            None => {
                debug!(resource = config.name, seq = ticket.value(), "dropping stale page");
                Ok(FetchOutcome::Superseded)
            }
            Some(Ok(rows)) => {
                info!(resource = config.name, seq = ticket.value(), rows, "page applied");
                Ok(FetchOutcome::Applied { rows })
            }
            Some(Err(err)) => {
                warn!(resource = config.name, error = %err, "page fetch failed");
                self.notifier.notify(Notification::error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Refetch at the current query.
    ///
    /// # Errors
    ///
    /// See [`ResourceFetcher::fetch_page`].
    pub async fn refresh(&self) -> Result<FetchOutcome, ApiError> {
        self.fetch_page(self.query()).await
    }

    #[must_use]
    pub fn view(&self) -> ListView<R::Row> {
        let state = self.lock();
        let (rows, shown_query) = match &state.page {
            Some(page) => (page.items.clone(), Some(page.query.clone())),
            None => (Vec::new(), None),
        };
        let pagination = match &shown_query {
            Some(query) => PaginationVm::new(R::config().list, query, rows.len()),
            None => PaginationVm::new(R::config().list, &state.query, 0),
        };
        ListView {
            rows,
            loading: state.loading,
            error: state.error.clone(),
            shown_query,
            pagination,
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<ResourcePage<R::Row>> {
        self.lock().page.clone()
    }

    /// Copy of a displayed row.
    #[must_use]
    pub fn row(&self, id: u64) -> Option<R::Row> {
        self.lock()
            .page
            .as_ref()
            .and_then(|page| page.items.iter().find(|row| R::row_id(row) == id).cloned())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListState<R::Row>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
