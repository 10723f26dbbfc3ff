use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ids::{CategoryLevelId, GroupId, InstructorId};
use crate::model::option::{SelectOption, ToOption};

/// Study group row. `has_schedule` flips on the next refetch after a
/// schedule batch succeeds; it is never patched locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub created_date: NaiveDate,
    pub category_level_id: CategoryLevelId,
    pub instructor_id: InstructorId,
    #[serde(default)]
    pub has_schedule: bool,
}

impl ToOption for Group {
    fn to_option(&self) -> SelectOption {
        SelectOption::new(self.id.value(), self.name.clone())
    }
}
