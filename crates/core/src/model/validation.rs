use std::fmt;

/// One field-level complaint from the server, addressed by dotted path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build from a server `loc` list.
    ///
    /// The first segment names the enclosing container (`body`, `query`, ...)
    /// and is dropped; the remaining segments are joined with `.`.
    #[must_use]
    pub fn from_loc<S: AsRef<str>>(loc: &[S], message: impl Into<String>) -> Self {
        let field = loc
            .iter()
            .skip(1)
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(".");
        Self::new(field, message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Collapse server validation errors into the single notification text.
///
/// There is no inline per-field placement; every error ends up on its own
/// line of one message.
#[must_use]
pub fn aggregate_message(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
