use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ids::InstructorId;
use crate::model::option::{SelectOption, ToOption};
use crate::model::user::User;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: InstructorId,
    pub user: User,
    pub work_started_date: NaiveDate,
}

impl ToOption for Instructor {
    fn to_option(&self) -> SelectOption {
        SelectOption::new(self.id.value(), self.user.short_name())
    }
}
