use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of entity whose day plan is viewed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScheduleOwner {
    #[default]
    Student,
    Instructor,
    Group,
}

impl ScheduleOwner {
    pub const ALL: [ScheduleOwner; 3] = [
        ScheduleOwner::Student,
        ScheduleOwner::Instructor,
        ScheduleOwner::Group,
    ];

    /// Collection name below `/api/`.
    #[must_use]
    pub fn resource(self) -> &'static str {
        match self {
            ScheduleOwner::Student => "students",
            ScheduleOwner::Instructor => "instructors",
            ScheduleOwner::Group => "groups",
        }
    }

    /// `{resource}/{id}/schedule`
    #[must_use]
    pub fn schedule_path(self, id: u64) -> String {
        format!("{}/{id}/schedule", self.resource())
    }
}

impl fmt::Display for ScheduleOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScheduleOwner::Student => "student",
            ScheduleOwner::Instructor => "instructor",
            ScheduleOwner::Group => "group",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown schedule owner `{0}` (expected student, instructor or group)")]
pub struct ParseOwnerError(String);

impl FromStr for ScheduleOwner {
    type Err = ParseOwnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScheduleOwner::ALL
            .into_iter()
            .find(|owner| owner.to_string() == s || owner.resource() == s)
            .ok_or_else(|| ParseOwnerError(s.to_string()))
    }
}

/// One slot of a day plan as the server reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub extra: String,
}
