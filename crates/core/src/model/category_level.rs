use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::model::ids::CategoryLevelId;
use crate::model::option::{SelectOption, ToOption};

/// Curriculum figures attached to a category level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLevelInfo {
    pub theory_lessons_count: u32,
    pub practice_lessons_count: u32,
    pub theory_lessons_duration: NaiveTime,
    pub practice_lessons_duration: NaiveTime,
    pub minimum_age_to_get: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLevel {
    pub id: CategoryLevelId,
    pub category: String,
    pub transmission: String,
    pub description: String,
    pub category_level_info: CategoryLevelInfo,
}

impl ToOption for CategoryLevel {
    fn to_option(&self) -> SelectOption {
        SelectOption::new(
            self.id.value(),
            format!("{} {}", self.category, self.transmission),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_label_joins_category_and_transmission() {
        let json = r#"{"id":3,"category":"B","transmission":"manual","description":"cars",
            "category_level_info":{"theory_lessons_count":20,"practice_lessons_count":20,
            "theory_lessons_duration":"02:00:00","practice_lessons_duration":"02:00:00",
            "minimum_age_to_get":18}}"#;
        let level: CategoryLevel = serde_json::from_str(json).unwrap();
        assert_eq!(level.to_option(), SelectOption::new(3, "B manual"));
    }
}
