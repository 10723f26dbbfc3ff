use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

entity_id!(
    /// Identifier of a user account (shared by students, instructors and admins)
    UserId
);
entity_id!(
    /// Identifier of a student record
    StudentId
);
entity_id!(
    /// Identifier of an instructor record
    InstructorId
);
entity_id!(
    /// Identifier of a study group
    GroupId
);
entity_id!(
    /// Identifier of a training vehicle
    VehicleId
);
entity_id!(
    /// Identifier of a classroom cabinet
    CabinetId
);
entity_id!(
    /// Identifier of a licence category level (e.g. "B manual")
    CategoryLevelId
);

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_id_display() {
        let id = StudentId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "StudentId(42)");
    }

    #[test]
    fn test_group_id_from_str() {
        let id: GroupId = " 123 ".parse().unwrap();
        assert_eq!(id, GroupId::new(123));
    }

    #[test]
    fn test_category_level_id_from_str_invalid() {
        let err = "B-manual".parse::<CategoryLevelId>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to parse CategoryLevelId from string"
        );
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&InstructorId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: InstructorId = serde_json::from_str("7").unwrap();
        assert_eq!(back, InstructorId::new(7));
    }
}
