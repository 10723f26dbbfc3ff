use serde::{Deserialize, Serialize};

use crate::model::ids::{CategoryLevelId, GroupId, StudentId};
use crate::model::option::{SelectOption, ToOption};
use crate::model::user::User;

/// Student row as returned by the list endpoints.
///
/// `has_schedule` is computed by the backend and only present on paginated
/// listings; it defaults to `false` elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub user: User,
    pub category_level_id: CategoryLevelId,
    pub group_id: GroupId,
    #[serde(default)]
    pub has_schedule: bool,
}

impl ToOption for Student {
    fn to_option(&self) -> SelectOption {
        SelectOption::new(self.id.value(), self.user.short_name())
    }
}
