//! Add/edit modal sessions over a resource.
//!
//! `Closed -> Clean -> Dirty -> Submitting -> {Closed | Dirty with error}`.
//! A successful write closes the modal and refetches the list at its current
//! query; the written entity is never merged into the visible page.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{info, warn};

use admin_core::model::{SelectOption, ValidationError};
use admin_core::schema::{Draft, DraftError, FieldValue, FormMode};
use admin_core::Clock;
use api::{ApiClient, ApiError};

use crate::catalog::Resource;
use crate::chain::{CascadeReport, DependentSelectionChain, SelectionStore};
use crate::error::FormError;
use crate::fetcher::ResourceFetcher;
use crate::notify::{Notification, Notifier};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormPhase {
    #[default]
    Closed,
    Clean,
    Dirty,
    Submitting,
}

#[derive(Default)]
struct FormState {
    phase: FormPhase,
    draft: Option<Draft>,
    errors: Vec<ValidationError>,
    message: Option<String>,
}

impl FormState {
    fn reset(&mut self) {
        *self = FormState::default();
    }
}

pub struct FormController<R: Resource> {
    api: ApiClient,
    fetcher: ResourceFetcher<R>,
    chain: DependentSelectionChain,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
    state: Mutex<FormState>,
}

struct DraftSelections<'a> {
    state: &'a Mutex<FormState>,
}

impl SelectionStore for DraftSelections<'_> {
    fn selection(&self, field: &str) -> Option<u64> {
        lock(self.state)
            .draft
            .as_ref()
            .and_then(|draft| draft.selection(field))
    }

    fn reset_selection(&self, field: &str) -> bool {
        lock(self.state)
            .draft
            .as_mut()
            .is_some_and(|draft| draft.clear_selection(field))
    }
}

impl<R: Resource> FormController<R> {
    #[must_use]
    pub fn new(
        api: ApiClient,
        fetcher: ResourceFetcher<R>,
        chain: DependentSelectionChain,
        notifier: Arc<dyn Notifier>,
        clock: Clock,
    ) -> Self {
        Self {
            api,
            fetcher,
            chain,
            notifier,
            clock,
            state: Mutex::new(FormState::default()),
        }
    }

    /// Open a blank add draft and load its option lists.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Busy` while a submission is in flight.
    pub async fn open_add(&self) -> Result<(), FormError> {
        let draft = Draft::blank(R::config().fields, self.clock.today());
        self.open(draft).await
    }

    /// Open an edit draft copied from a displayed row.
    ///
    /// # Errors
    ///
    /// Returns `FormError::RowNotFound` if `id` is not on the current page.
    pub async fn open_edit(&self, id: u64) -> Result<(), FormError> {
        let row = self.fetcher.row(id).ok_or(FormError::RowNotFound(id))?;
        self.open_edit_row(&row).await
    }

    /// Open an edit draft seeded from `row`. The draft is an owned copy.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Seed` if the row cannot be read.
    pub async fn open_edit_row(&self, row: &R::Row) -> Result<(), FormError> {
        let seed = serde_json::to_value(row).map_err(|err| FormError::Seed(err.to_string()))?;
        let draft = Draft::from_row(R::config().fields, &seed, R::row_id(row));
        self.open(draft).await
    }

    async fn open(&self, draft: Draft) -> Result<(), FormError> {
        {
            let mut state = self.lock();
            if state.phase == FormPhase::Submitting {
                return Err(FormError::Busy);
            }
            state.reset();
            state.phase = FormPhase::Clean;
            state.draft = Some(draft);
        }

        let config = R::config();
        for dependency in config.dependencies {
            self.chain.cache().clear(dependency.child);
        }
        self.chain.load_static(config.static_options).await;

        let store = self.selections();
        for root in self.chain.roots() {
            if store.selection(root).is_some() {
                self.chain.parent_changed(root, &store).await;
            }
        }
        Ok(())
    }

    /// Update one field. A change of a dependency parent cascades to its
    /// children before this returns.
    ///
    /// # Errors
    ///
    /// Returns `FormError::NotOpen`/`Busy` outside an editable phase, or
    /// `FormError::Draft` if the value does not fit the field.
    pub async fn set_field(&self, path: &str, value: FieldValue) -> Result<CascadeReport, FormError> {
        {
            let mut state = self.lock();
            match state.phase {
                FormPhase::Closed => return Err(FormError::NotOpen),
                FormPhase::Submitting => return Err(FormError::Busy),
                FormPhase::Clean | FormPhase::Dirty => {}
            }
            let draft = state.draft.as_mut().ok_or(FormError::NotOpen)?;
            draft.set(path, value)?;
            state.phase = FormPhase::Dirty;
        }

        if self.chain.is_parent(path) {
            Ok(self.chain.parent_changed(path, &self.selections()).await)
        } else {
            Ok(CascadeReport::default())
        }
    }

    /// Parse `raw` for the field's kind, then [`FormController::set_field`].
    ///
    /// # Errors
    ///
    /// See [`FormController::set_field`].
    pub async fn set_raw(&self, path: &str, raw: &str) -> Result<CascadeReport, FormError> {
        let spec = R::config()
            .fields
            .iter()
            .find(|spec| spec.path == path)
            .ok_or_else(|| DraftError::UnknownField(path.to_string()))?;
        let value = FieldValue::parse(spec.path, spec.kind, raw)?;
        self.set_field(path, value).await
    }

    /// Submit the draft.
    ///
    /// A missing required selection notifies and returns without any
    /// request. Server failures keep the modal open with the error recorded;
    /// success closes it, notifies and refetches the list.
    ///
    /// # Errors
    ///
    /// `FormError::MissingSelection` for the client-side check,
    /// `FormError::Api` for server or transport failures.
    pub async fn submit(&self) -> Result<Value, FormError> {
        let config = R::config();
        let (mode, payload) = {
            let mut state = self.lock();
            match state.phase {
                FormPhase::Closed => return Err(FormError::NotOpen),
                FormPhase::Submitting => return Err(FormError::Busy),
                FormPhase::Clean | FormPhase::Dirty => {}
            }
            let draft = state.draft.as_ref().ok_or(FormError::NotOpen)?;
            // One notification per submit, for the first unselected field in
            // form order. Edit drafts are checked too: a parent change can
            // leave a dependent select empty.
            if let Some(message) = draft.missing_selection() {
                state.message = Some(message.to_string());
                drop(state);
                self.notifier.notify(Notification::error(message));
                return Err(FormError::MissingSelection(message));
            }
            let submission = (draft.mode(), draft.to_payload());
            state.phase = FormPhase::Submitting;
            state.errors.clear();
            state.message = None;
            submission
        };

        let result = match mode {
            FormMode::Add => self.api.create(config.name, payload).await,
            FormMode::Edit { id } => self.api.update(config.name, id, payload).await,
        };

        match result {
            Ok(entity) => {
                self.lock().reset();
                let message = match mode {
                    FormMode::Add => config.created_message,
                    FormMode::Edit { .. } => config.updated_message,
                };
                info!(resource = config.name, ?mode, "write succeeded");
                self.notifier.notify(Notification::success(message));
                if let Err(err) = self.fetcher.refresh().await {
                    warn!(resource = config.name, error = %err, "refetch after write failed");
                }
                Ok(entity)
            }
            Err(err) => {
                let message = err.user_message();
                {
                    let mut state = self.lock();
                    state.phase = FormPhase::Dirty;
                    state.errors = match &err {
                        ApiError::Validation(errors) => errors.clone(),
                        _ => Vec::new(),
                    };
                    state.message = Some(message.clone());
                }
                warn!(resource = config.name, error = %err, "write failed");
                self.notifier.notify(Notification::error(message));
                Err(FormError::Api(err))
            }
        }
    }

    /// Discard the draft. Refused while submitting.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        if state.phase == FormPhase::Submitting {
            return false;
        }
        state.reset();
        true
    }

    #[must_use]
    pub fn phase(&self) -> FormPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn draft(&self) -> Option<Draft> {
        self.lock().draft.clone()
    }

    /// Field errors of the last failed submission.
    #[must_use]
    pub fn errors(&self) -> Vec<ValidationError> {
        self.lock().errors.clone()
    }

    /// Notification text of the last failure.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.lock().message.clone()
    }

    #[must_use]
    pub fn options(&self, field: &str) -> Vec<SelectOption> {
        self.chain.options(field)
    }

    #[must_use]
    pub fn options_settled(&self, field: &str) -> bool {
        self.chain.cache().is_authoritative(field)
    }

    fn selections(&self) -> DraftSelections<'_> {
        DraftSelections { state: &self.state }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<FormState>) -> MutexGuard<'_, FormState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
