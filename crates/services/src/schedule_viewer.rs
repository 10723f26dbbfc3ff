//! Day plan of one student, instructor or group.
//!
//! The entity list comes from the owner's collection; the plan itself from
//! `GET /api/{owner}s/{id}/schedule?dt=YYYY-MM-DD`. Only the response for
//! the latest selection and date is shown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use admin_core::Clock;
use admin_core::model::{ScheduleEntry, ScheduleOwner, SelectOption, contains_value};
use api::ApiClient;

use crate::catalog::{ALL_GROUPS, ALL_INSTRUCTORS, ALL_STUDENTS, OptionSource};
use crate::error::ScheduleViewerError;
use crate::fetcher::FetchOutcome;
use crate::notify::{Notification, Notifier};
use crate::options::{LoadOutcome, OptionCache};
use crate::sequence::SequenceGate;

const ENTITY_CHANNEL: &str = "schedule.entity";
const FETCH_FAILED: &str = "Failed to fetch schedule";

fn entity_source(owner: ScheduleOwner) -> &'static OptionSource {
    match owner {
        ScheduleOwner::Student => &ALL_STUDENTS,
        ScheduleOwner::Instructor => &ALL_INSTRUCTORS,
        ScheduleOwner::Group => &ALL_GROUPS,
    }
}

struct ViewerState {
    owner: ScheduleOwner,
    selected: Option<u64>,
    date: NaiveDate,
    entries: Vec<ScheduleEntry>,
    loading: bool,
}

pub struct ScheduleViewer {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    options: OptionCache,
    gate: SequenceGate,
    state: Mutex<ViewerState>,
}

impl ScheduleViewer {
    /// Starts on students, nothing selected, dated today.
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>, clock: Clock) -> Self {
        let options = OptionCache::new(api.clone(), Arc::clone(&notifier));
        Self {
            api,
            notifier,
            options,
            gate: SequenceGate::new(),
            state: Mutex::new(ViewerState {
                owner: ScheduleOwner::default(),
                selected: None,
                date: clock.today(),
                entries: Vec::new(),
                loading: false,
            }),
        }
    }

    /// Load the selectable entities of the current owner type.
    pub async fn load_entities(&self) -> LoadOutcome {
        let owner = self.owner();
        self.options
            .load(ENTITY_CHANNEL, entity_source(owner), None)
            .await
    }

    /// Switch the owner type. The selection and the shown plan are cleared
    /// and any plan request in flight is dropped.
    pub async fn set_owner(&self, owner: ScheduleOwner) -> LoadOutcome {
        self.gate.issue();
        {
            let mut state = self.lock();
            state.owner = owner;
            state.selected = None;
            state.entries.clear();
            state.loading = false;
        }
        self.options.clear(ENTITY_CHANNEL);
        self.load_entities().await
    }

    /// Pick an entity and fetch its plan; `None` clears the plan.
    ///
    /// # Errors
    ///
    /// `ScheduleViewerError::UnknownEntity` if a loaded list does not offer
    /// `id`, otherwise the errors of [`ScheduleViewer::refresh`].
    pub async fn select(&self, id: Option<u64>) -> Result<FetchOutcome, ScheduleViewerError> {
        let listed = self.options.key(ENTITY_CHANNEL).is_some()
            && self.options.is_authoritative(ENTITY_CHANNEL);
        if let Some(id) = id {
            if listed && !contains_value(&self.entity_options(), id) {
                return Err(ScheduleViewerError::UnknownEntity {
                    owner: self.owner(),
                    id,
                });
            }
        }
        self.lock().selected = id;
        self.refresh().await
    }

    /// # Errors
    ///
    /// See [`ScheduleViewer::refresh`].
    pub async fn set_date(&self, date: NaiveDate) -> Result<FetchOutcome, ScheduleViewerError> {
        self.lock().date = date;
        self.refresh().await
    }

    /// # Errors
    ///
    /// See [`ScheduleViewer::refresh`].
    pub async fn previous_day(&self) -> Result<FetchOutcome, ScheduleViewerError> {
        let date = self.date();
        self.set_date(date.checked_sub_days(Days::new(1)).unwrap_or(date))
            .await
    }

    /// # Errors
    ///
    /// See [`ScheduleViewer::refresh`].
    pub async fn next_day(&self) -> Result<FetchOutcome, ScheduleViewerError> {
        let date = self.date();
        self.set_date(date.checked_add_days(Days::new(1)).unwrap_or(date))
            .await
    }

    /// Fetch the plan for the current selection and date. Without a
    /// selection the plan is emptied and nothing is requested.
    ///
    /// A failure keeps the last plan on screen and notifies.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleViewerError::Api` when the request fails.
    pub async fn refresh(&self) -> Result<FetchOutcome, ScheduleViewerError> {
        let ticket = self.gate.issue();
        let (owner, id, date) = {
            let mut state = self.lock();
            let Some(id) = state.selected else {
                state.entries.clear();
                state.loading = false;
                return Ok(FetchOutcome::Applied { rows: 0 });
            };
            state.loading = true;
            (state.owner, id, state.date)
        };

        let path = owner.schedule_path(id);
        debug!(%owner, id, %date, seq = ticket.value(), "fetching schedule");
        let result = self
            .api
            .fetch_collection_at::<ScheduleEntry>(
                &path,
                vec![("dt".to_string(), date.format("%Y-%m-%d").to_string())],
            )
            .await;

        let applied = self.gate.settle(ticket, || {
            let mut state = self.lock();
            state.loading = false;
            match result {
                Ok(entries) => {
                    let rows = entries.len();
                    state.entries = entries;
                    Ok(rows)
                }
                Err(err) => Err(err),
            }
        });

        match applied {
            None => {
                debug!(%owner, id, seq = ticket.value(), "dropping stale schedule");
                Ok(FetchOutcome::Superseded)
            }
            Some(Ok(rows)) => Ok(FetchOutcome::Applied { rows }),
            Some(Err(err)) => {
                warn!(%owner, id, %date, error = %err, "schedule fetch failed");
                self.notifier.notify(Notification::error(FETCH_FAILED));
                Err(err.into())
            }
        }
    }

    #[must_use]
    pub fn owner(&self) -> ScheduleOwner {
        self.lock().owner
    }

    #[must_use]
    pub fn selected(&self) -> Option<u64> {
        self.lock().selected
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.lock().date
    }

    #[must_use]
    pub fn entries(&self) -> Vec<ScheduleEntry> {
        self.lock().entries.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    #[must_use]
    pub fn entity_options(&self) -> Vec<SelectOption> {
        self.options.options(ENTITY_CHANNEL)
    }

    /// Title line above the plan table.
    #[must_use]
    pub fn heading(&self) -> String {
        let state = self.lock();
        if state.entries.is_empty() {
            format!("No schedule found for {}", state.date)
        } else {
            format!("Schedule for {}", state.date)
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
