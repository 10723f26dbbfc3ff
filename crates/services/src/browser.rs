//! One list screen: query bar, fetcher, filter options, add/edit modal and
//! batch modal, all configured by a `Resource`.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use admin_core::Clock;
use admin_core::model::SelectOption;
use admin_core::query::{FilterValue, PageSize, QueryState, SortOrder};
use admin_core::settings::ClientSettings;
use api::ApiClient;

use crate::batch::BatchActionController;
use crate::catalog::Resource;
use crate::chain::DependentSelectionChain;
use crate::debounce::SearchDebouncer;
use crate::error::BrowserError;
use crate::fetcher::{FetchOutcome, ResourceFetcher};
use crate::form::FormController;
use crate::notify::Notifier;
use crate::options::OptionCache;
use crate::view::ListView;

pub struct ResourceBrowser<R: Resource> {
    fetcher: ResourceFetcher<R>,
    filter_options: OptionCache,
    form: FormController<R>,
    batch: BatchActionController<R>,
    debouncer: SearchDebouncer,
}

impl<R: Resource> ResourceBrowser<R> {
    /// Build the browser. Nothing is fetched until [`ResourceBrowser::mount`].
    ///
    /// # Errors
    ///
    /// Returns `BrowserError::Chain` if the resource's dependencies form a
    /// cycle.
    pub fn new(
        api: ApiClient,
        notifier: Arc<dyn Notifier>,
        settings: &ClientSettings,
        clock: Clock,
    ) -> Result<Self, BrowserError> {
        let config = R::config();
        let mut query = QueryState::new(settings.page_size());
        if let Some(sort) = config.default_sort {
            query = query.with_sort(sort);
        }

        let fetcher = ResourceFetcher::new(api.clone(), Arc::clone(&notifier), query);
        let filter_options = OptionCache::new(api.clone(), Arc::clone(&notifier));
        let form_options = OptionCache::new(api.clone(), Arc::clone(&notifier));
        let chain = DependentSelectionChain::new(form_options.clone(), config.dependencies)?;
        let form = FormController::new(
            api.clone(),
            fetcher.clone(),
            chain,
            Arc::clone(&notifier),
            clock,
        );
        let batch = BatchActionController::new(
            api,
            fetcher.clone(),
            form_options,
            notifier,
            clock,
        );

        Ok(Self {
            fetcher,
            filter_options,
            form,
            batch,
            debouncer: SearchDebouncer::new(settings.debounce()),
        })
    }

    /// Load the filter option lists and the first page concurrently.
    ///
    /// # Errors
    ///
    /// Returns the page fetch failure; option failures only notify.
    pub async fn mount(&self) -> Result<FetchOutcome, BrowserError> {
        let filters = async {
            join_all(R::config().filters.iter().filter_map(|filter| {
                filter
                    .options
                    .map(|source| async move {
                        self.filter_options.load(filter.name, &source, None).await
                    })
            }))
            .await
        };
        let (_, page) = futures::join!(filters, self.fetcher.refresh());
        Ok(page?)
    }

    /// Set or clear a named filter; returns to page 1.
    ///
    /// # Errors
    ///
    /// `BrowserError::UnknownFilter` for names the resource does not accept.
    pub async fn set_filter(
        &self,
        name: &str,
        value: Option<FilterValue>,
    ) -> Result<FetchOutcome, BrowserError> {
        let spec = R::config()
            .filter(name)
            .ok_or_else(|| BrowserError::UnknownFilter(name.to_string()))?;
        let current = self.fetcher.query();
        let next = match value {
            Some(value) => current.with_filter(spec.name, value),
            None => current.without_filter(spec.name),
        };
        self.fetch(next).await
    }

    /// Debounced search. Calls superseded within the quiet period return
    /// `FetchOutcome::Superseded` without a request.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure of the settled call.
    pub async fn set_search(&self, text: &str) -> Result<FetchOutcome, BrowserError> {
        if !self.debouncer.settle().await {
            debug!(resource = R::config().name, "search superseded while typing");
            return Ok(FetchOutcome::Superseded);
        }
        self.fetch(self.fetcher.query().with_search(text)).await
    }

    /// # Errors
    ///
    /// `BrowserError::UnknownSortKey` for keys the resource does not accept.
    pub async fn set_sort(&self, key: &str) -> Result<FetchOutcome, BrowserError> {
        if !R::config().accepts_sort_key(key) {
            return Err(BrowserError::UnknownSortKey(key.to_string()));
        }
        self.fetch(self.fetcher.query().with_sort(key)).await
    }

    /// # Errors
    ///
    /// Returns the fetch failure.
    pub async fn set_sort_order(&self, order: SortOrder) -> Result<FetchOutcome, BrowserError> {
        self.fetch(self.fetcher.query().with_sort_order(order)).await
    }

    /// # Errors
    ///
    /// Returns the fetch failure.
    pub async fn set_page_size(&self, size: PageSize) -> Result<FetchOutcome, BrowserError> {
        self.fetch(self.fetcher.query().with_page_size(size)).await
    }

    /// # Errors
    ///
    /// `BrowserError::Query` for page 0, otherwise the fetch failure.
    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome, BrowserError> {
        let next = self.fetcher.query().with_page(page)?;
        self.fetch(next).await
    }

    /// # Errors
    ///
    /// `BrowserError::NoNextPage` when the shown page was not full.
    pub async fn next_page(&self) -> Result<FetchOutcome, BrowserError> {
        let view = self.fetcher.view();
        if !view.pagination.can_next {
            return Err(BrowserError::NoNextPage);
        }
        self.set_page(view.pagination.page + 1).await
    }

    /// # Errors
    ///
    /// `BrowserError::NoPreviousPage` on page 1.
    pub async fn previous_page(&self) -> Result<FetchOutcome, BrowserError> {
        let view = self.fetcher.view();
        if !view.pagination.can_prev {
            return Err(BrowserError::NoPreviousPage);
        }
        self.set_page(view.pagination.page - 1).await
    }

    /// # Errors
    ///
    /// Returns the fetch failure.
    pub async fn refresh(&self) -> Result<FetchOutcome, BrowserError> {
        Ok(self.fetcher.refresh().await?)
    }

    #[must_use]
    pub fn query(&self) -> QueryState {
        self.fetcher.query()
    }

    #[must_use]
    pub fn view(&self) -> ListView<R::Row> {
        self.fetcher.view()
    }

    #[must_use]
    pub fn filter_options(&self, name: &str) -> Vec<SelectOption> {
        self.filter_options.options(name)
    }

    #[must_use]
    pub fn fetcher(&self) -> &ResourceFetcher<R> {
        &self.fetcher
    }

    #[must_use]
    pub fn form(&self) -> &FormController<R> {
        &self.form
    }

    #[must_use]
    pub fn batch(&self) -> &BatchActionController<R> {
        &self.batch
    }

    async fn fetch(&self, query: QueryState) -> Result<FetchOutcome, BrowserError> {
        Ok(self.fetcher.fetch_page(query).await?)
    }
}
