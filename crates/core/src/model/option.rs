use serde::{Deserialize, Serialize};

/// Display projection of a domain entity for select inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: u64,
    pub label: String,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: u64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// Entities that can be offered in a select input.
pub trait ToOption {
    fn to_option(&self) -> SelectOption;
}

/// Returns true if `value` is one of the offered options.
#[must_use]
pub fn contains_value(options: &[SelectOption], value: u64) -> bool {
    options.iter().any(|opt| opt.value == value)
}
