use chrono::{Duration, NaiveDate};
use serde_json::{Value, json};
use thiserror::Error;

use crate::model::ids::{CategoryLevelId, GroupId, InstructorId, StudentId};

/// Advisory client-side range for `schedules_per_day`. The server enforces
/// its own limits and its rejection always wins.
pub const SCHEDULES_PER_DAY_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScheduleError {
    #[error("Please select an instructor")]
    MissingInstructor,

    #[error("End date must not be earlier than start date")]
    EndBeforeStart,

    #[error("Schedules per day must be between 1 and 20 (got {0})")]
    PerDayOutOfRange(u32),
}

/// Entity a schedule batch is generated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchTarget {
    /// Theory lessons for a whole group.
    Group(GroupId),
    /// Driving practice for one student; instructors are narrowed to the
    /// student's category level.
    Student {
        student_id: StudentId,
        category_level_id: CategoryLevelId,
    },
}

impl BatchTarget {
    /// Endpoint path below `/api/`.
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            BatchTarget::Group(_) => "group_schedules/create_butch",
            BatchTarget::Student { .. } => "practice_schedules/create_butch",
        }
    }

    #[must_use]
    pub fn requires_instructor(&self) -> bool {
        matches!(self, BatchTarget::Student { .. })
    }
}

/// Editable parameters of the "generate schedule" modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleBatchDraft {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schedules_per_day: u32,
    pub include_weekends: bool,
    pub instructor_id: Option<InstructorId>,
}

impl ScheduleBatchDraft {
    /// Defaults shown when the modal opens: tomorrow through a month out,
    /// one slot a day, weekdays only.
    #[must_use]
    pub fn defaults(today: NaiveDate) -> Self {
        Self {
            start_date: today + Duration::days(1),
            end_date: today + Duration::days(31),
            schedules_per_day: 1,
            include_weekends: false,
            instructor_id: None,
        }
    }

    /// Run the advisory checks and bind the draft to its target.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` for a missing instructor (practice batches),
    /// an end date before the start date, or an out-of-range daily count.
    pub fn validate(&self, target: BatchTarget) -> Result<ScheduleBatch, ScheduleError> {
        let instructor_id = match (target.requires_instructor(), self.instructor_id) {
            (true, None) => return Err(ScheduleError::MissingInstructor),
            (_, instructor) => instructor,
        };
        if self.end_date < self.start_date {
            return Err(ScheduleError::EndBeforeStart);
        }
        if !SCHEDULES_PER_DAY_RANGE.contains(&self.schedules_per_day) {
            return Err(ScheduleError::PerDayOutOfRange(self.schedules_per_day));
        }

        Ok(ScheduleBatch {
            target,
            instructor_id,
            start_date: self.start_date,
            end_date: self.end_date,
            schedules_per_day: self.schedules_per_day,
            include_weekends: self.include_weekends,
        })
    }
}

/// A validated batch request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleBatch {
    target: BatchTarget,
    instructor_id: Option<InstructorId>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    schedules_per_day: u32,
    include_weekends: bool,
}

impl ScheduleBatch {
    #[must_use]
    pub fn target(&self) -> BatchTarget {
        self.target
    }

    /// JSON body for the batch endpoint.
    #[must_use]
    pub fn payload(&self) -> Value {
        let start_date = self.start_date.format("%Y-%m-%d").to_string();
        let end_date = self.end_date.format("%Y-%m-%d").to_string();
        match self.target {
            BatchTarget::Group(group_id) => json!({
                "group_id": group_id,
                "start_date": start_date,
                "end_date": end_date,
                "schedules_per_day": self.schedules_per_day,
                "include_weekends": self.include_weekends,
            }),
            BatchTarget::Student { student_id, .. } => json!({
                "student_id": student_id,
                "instructor_id": self.instructor_id,
                "start_date": start_date,
                "end_date": end_date,
                "schedules_per_day": self.schedules_per_day,
                "include_weekends": self.include_weekends,
            }),
        }
    }
}
