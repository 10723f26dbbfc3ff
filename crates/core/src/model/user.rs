use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;

/// Account data embedded in student and instructor records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub patronymic: Option<String>,
    pub birthday: NaiveDate,
    pub phone_number: String,
}

impl User {
    /// "Ivanov I. P." style label: last name plus initials.
    ///
    /// The patronymic initial is only added when a patronymic is present.
    #[must_use]
    pub fn short_name(&self) -> String {
        let mut label = self.last_name.clone();
        if let Some(initial) = self.first_name.chars().next() {
            label.push(' ');
            label.push(initial);
            label.push('.');
        }
        if let Some(initial) = self
            .patronymic
            .as_deref()
            .and_then(|value| value.chars().next())
        {
            label.push(' ');
            label.push(initial);
            label.push('.');
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(patronymic: Option<&str>) -> User {
        User {
            id: None,
            username: "ivanov".into(),
            first_name: "Ivan".into(),
            last_name: "Ivanov".into(),
            patronymic: patronymic.map(str::to_owned),
            birthday: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            phone_number: "+79990001122".into(),
        }
    }

    #[test]
    fn short_name_includes_patronymic_initial() {
        assert_eq!(user(Some("Petrovich")).short_name(), "Ivanov I. P.");
    }

    #[test]
    fn short_name_skips_missing_patronymic() {
        assert_eq!(user(None).short_name(), "Ivanov I.");
    }

    #[test]
    fn null_patronymic_deserializes_as_none() {
        let json = r#"{"username":"ivanov","first_name":"Ivan","last_name":"Ivanov",
            "patronymic":null,"birthday":"2000-01-01","phone_number":"+79990001122"}"#;
        let parsed: User = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.patronymic, None);
        assert_eq!(parsed.id, None);
    }
}
