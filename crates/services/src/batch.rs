//! Schedule generation for a group or a student.
//!
//! The action does not touch the invoking row; on success the list is
//! refetched so the server-computed `has_schedule` flag shows up. On
//! failure the modal stays open and nothing is refetched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use admin_core::Clock;
use admin_core::model::{
    BatchTarget, InstructorId, ScheduleBatch, ScheduleBatchDraft, SelectOption, contains_value,
};
use api::{ApiClient, ApiError};

use crate::catalog::{INSTRUCTORS_BY_CATEGORY, Resource};
use crate::error::BatchError;
use crate::fetcher::ResourceFetcher;
use crate::notify::{Notification, Notifier};
use crate::options::{LoadOutcome, OptionCache};

const INSTRUCTOR_CHANNEL: &str = "batch.instructor_id";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchPhase {
    #[default]
    Closed,
    Open,
    Submitting,
}

#[derive(Default)]
struct BatchState {
    phase: BatchPhase,
    target: Option<BatchTarget>,
    draft: Option<ScheduleBatchDraft>,
    error: Option<String>,
}

pub struct BatchActionController<R: Resource> {
    api: ApiClient,
    fetcher: ResourceFetcher<R>,
    options: OptionCache,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
    state: Mutex<BatchState>,
}

impl<R: Resource> BatchActionController<R> {
    #[must_use]
    pub fn new(
        api: ApiClient,
        fetcher: ResourceFetcher<R>,
        options: OptionCache,
        notifier: Arc<dyn Notifier>,
        clock: Clock,
    ) -> Self {
        Self {
            api,
            fetcher,
            options,
            notifier,
            clock,
            state: Mutex::new(BatchState::default()),
        }
    }

    /// Open the modal for a displayed row.
    ///
    /// # Errors
    ///
    /// `BatchError::RowNotFound` if the row is not shown,
    /// `BatchError::Unsupported` if the resource has no batch action.
    pub async fn open_for_row(&self, id: u64) -> Result<(), BatchError> {
        let row = self.fetcher.row(id).ok_or(BatchError::RowNotFound(id))?;
        let target = R::batch_target(&row).ok_or(BatchError::Unsupported)?;
        self.open(target).await
    }

    /// Open the modal with default parameters. Student targets also load
    /// the instructors of the student's category level.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Busy` while a previous request is in flight.
    pub async fn open(&self, target: BatchTarget) -> Result<(), BatchError> {
        {
            let mut state = self.lock();
            if state.phase == BatchPhase::Submitting {
                return Err(BatchError::Busy);
            }
            *state = BatchState {
                phase: BatchPhase::Open,
                target: Some(target),
                draft: Some(ScheduleBatchDraft::defaults(self.clock.today())),
                error: None,
            };
        }

        self.options.clear(INSTRUCTOR_CHANNEL);
        if let BatchTarget::Student {
            category_level_id, ..
        } = target
        {
            let outcome = self
                .options
                .load(
                    INSTRUCTOR_CHANNEL,
                    &INSTRUCTORS_BY_CATEGORY,
                    Some(category_level_id.value()),
                )
                .await;
            if outcome != LoadOutcome::Superseded {
                self.revalidate_instructor();
            }
        }
        Ok(())
    }

    /// Reset an instructor picked before the list landed if the list does
    /// not offer it. Returns `true` if a selection was dropped.
    fn revalidate_instructor(&self) -> bool {
        let offered = self.options.options(INSTRUCTOR_CHANNEL);
        let mut state = self.lock();
        let Some(draft) = state.draft.as_mut() else {
            return false;
        };
        match draft.instructor_id {
            Some(instructor) if !contains_value(&offered, instructor.value()) => {
                debug!(instructor = %instructor, "instructor not offered; resetting");
                draft.instructor_id = None;
                true
            }
            _ => false,
        }
    }

    /// Edit the open draft in place.
    ///
    /// # Errors
    ///
    /// `BatchError::NotOpen`/`Busy` outside the open phase.
    pub fn edit(&self, apply: impl FnOnce(&mut ScheduleBatchDraft)) -> Result<(), BatchError> {
        let mut state = self.lock();
        match state.phase {
            BatchPhase::Closed => Err(BatchError::NotOpen),
            BatchPhase::Submitting => Err(BatchError::Busy),
            BatchPhase::Open => {
                let draft = state.draft.as_mut().ok_or(BatchError::NotOpen)?;
                apply(draft);
                Ok(())
            }
        }
    }

    /// # Errors
    ///
    /// See [`BatchActionController::edit`].
    pub fn select_instructor(&self, instructor: Option<InstructorId>) -> Result<(), BatchError> {
        self.edit(|draft| draft.instructor_id = instructor)
    }

    /// Validate and send the open draft.
    ///
    /// # Errors
    ///
    /// `BatchError::Invalid` for the advisory client checks,
    /// `BatchError::Api` when the server rejects the request.
    pub async fn submit(&self) -> Result<String, BatchError> {
        let needs_instructor = self.lock().target.is_some_and(|target| target.requires_instructor());
        if needs_instructor && self.options.is_authoritative(INSTRUCTOR_CHANNEL) {
            self.revalidate_instructor();
        }
        let batch = {
            let mut state = self.lock();
            match state.phase {
                BatchPhase::Closed => return Err(BatchError::NotOpen),
                BatchPhase::Submitting => return Err(BatchError::Busy),
                BatchPhase::Open => {}
            }
            let (Some(target), Some(draft)) = (state.target, state.draft.clone()) else {
                return Err(BatchError::NotOpen);
            };
            match draft.validate(target) {
                Ok(batch) => {
                    state.phase = BatchPhase::Submitting;
                    state.error = None;
                    batch
                }
                Err(err) => {
                    state.error = Some(err.to_string());
                    drop(state);
                    self.notifier.notify(Notification::error(err.to_string()));
                    return Err(BatchError::Invalid(err));
                }
            }
        };

        match self.invoke(&batch).await {
            Ok(detail) => {
                *self.lock() = BatchState::default();
                self.notifier.notify(Notification::success(detail.clone()));
                if let Err(err) = self.fetcher.refresh().await {
                    warn!(error = %err, "refetch after batch action failed");
                }
                Ok(detail)
            }
            Err(err) => {
                let message = err.user_message();
                {
                    let mut state = self.lock();
                    state.phase = BatchPhase::Open;
                    state.error = Some(message.clone());
                }
                self.notifier.notify(Notification::error(message));
                Err(BatchError::Api(err))
            }
        }
    }

    /// Send a validated batch without touching modal state.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection or transport failure.
    pub async fn invoke(&self, batch: &ScheduleBatch) -> Result<String, ApiError> {
        let endpoint = batch.target().endpoint();
        let result = self.api.post_action(endpoint, batch.payload()).await;
        match &result {
            Ok(detail) => info!(endpoint, detail = %detail, "batch action accepted"),
            Err(err) => warn!(endpoint, error = %err, "batch action rejected"),
        }
        result
    }

    pub fn close(&self) -> bool {
        let mut state = self.lock();
        if state.phase == BatchPhase::Submitting {
            return false;
        }
        *state = BatchState::default();
        true
    }

    #[must_use]
    pub fn phase(&self) -> BatchPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn draft(&self) -> Option<ScheduleBatchDraft> {
        self.lock().draft.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    #[must_use]
    pub fn instructor_options(&self) -> Vec<SelectOption> {
        self.options.options(INSTRUCTOR_CHANNEL)
    }

    fn lock(&self) -> MutexGuard<'_, BatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
