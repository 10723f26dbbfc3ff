//! Category levels an instructor may teach.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use admin_core::model::{CategoryLevel, CategoryLevelId, InstructorId, ToOption};
use api::ApiClient;

use crate::error::AssignmentError;
use crate::notify::{Notification, Notifier};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentRow {
    pub category_level_id: CategoryLevelId,
    pub label: String,
    pub assigned: bool,
}

#[derive(Default)]
struct AssignmentState {
    all: Vec<CategoryLevel>,
    assigned: BTreeSet<CategoryLevelId>,
}

/// Membership is changed locally only after the server confirms.
pub struct CategoryAssignment {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    instructor_id: InstructorId,
    state: Mutex<AssignmentState>,
}

impl CategoryAssignment {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>, instructor_id: InstructorId) -> Self {
        Self {
            api,
            notifier,
            instructor_id,
            state: Mutex::new(AssignmentState::default()),
        }
    }

    /// Load every category level and the instructor's current ones
    /// concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first failure; it is also notified.
    pub async fn load(&self) -> Result<(), AssignmentError> {
        let assigned_path = format!("instructors/{}/categories", self.instructor_id.value());
        let loaded = futures::try_join!(
            self.api.list_all::<CategoryLevel>("category_levels"),
            self.api.fetch_collection::<CategoryLevel>(&assigned_path),
        );
        match loaded {
            Ok((all, assigned)) => {
                let mut state = self.lock();
                state.all = all;
                state.assigned = assigned.into_iter().map(|level| level.id).collect();
                Ok(())
            }
            Err(err) => {
                warn!(instructor = %self.instructor_id, error = %err, "category load failed");
                self.notifier.notify(Notification::error(err.user_message()));
                Err(err.into())
            }
        }
    }

    #[must_use]
    pub fn rows(&self) -> Vec<AssignmentRow> {
        let state = self.lock();
        state
            .all
            .iter()
            .map(|level| AssignmentRow {
                category_level_id: level.id,
                label: level.to_option().label,
                assigned: state.assigned.contains(&level.id),
            })
            .collect()
    }

    /// Assign or unassign a category level.
    ///
    /// # Errors
    ///
    /// `AssignmentError::UnknownCategory` for levels not loaded,
    /// `AssignmentError::Api` when the server refuses.
    pub async fn set_assigned(
        &self,
        category_level_id: CategoryLevelId,
        assigned: bool,
    ) -> Result<String, AssignmentError> {
        if !self.lock().all.iter().any(|level| level.id == category_level_id) {
            return Err(AssignmentError::UnknownCategory(category_level_id.value()));
        }

        let instructor = self.instructor_id.value();
        let result = if assigned {
            self.api
                .post_query(
                    &format!("instructors/{instructor}/categories"),
                    vec![(
                        "category_level_id".to_string(),
                        category_level_id.value().to_string(),
                    )],
                )
                .await
        } else {
            self.api
                .delete(&format!(
                    "instructors/{instructor}/categories/{}",
                    category_level_id.value()
                ))
                .await
        };

        match result {
            Ok(detail) => {
                {
                    let mut state = self.lock();
                    if assigned {
                        state.assigned.insert(category_level_id);
                    } else {
                        state.assigned.remove(&category_level_id);
                    }
                }
                info!(instructor, category = %category_level_id, assigned, "assignment changed");
                self.notifier.notify(Notification::success(detail.clone()));
                Ok(detail)
            }
            Err(err) => {
                self.notifier.notify(Notification::error(err.user_message()));
                Err(err.into())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, AssignmentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
