use thiserror::Error;

use admin_core::model::{ValidationError, aggregate_message};

use crate::transport::TransportError;
use crate::wire::{Detail, ErrorBody};

/// Text shown for failures the user can do nothing specific about.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Text shown when there is no session or the server refused the token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Failures of a single backend call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    /// No session; the request was never sent.
    #[error("not signed in")]
    Unauthenticated,

    /// The server refused the bearer credential (401).
    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    /// Structured field validation failure.
    #[error("{}", aggregate_message(.0))]
    Validation(Vec<ValidationError>),

    /// Any other non-2xx status with a `detail` message.
    #[error("request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Interpret a non-2xx response.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.detail);

        if status == 401 {
            let detail = match detail {
                Some(Detail::Message(message)) => message,
                _ => String::new(),
            };
            return ApiError::Unauthorized { detail };
        }

        match detail {
            Some(Detail::Items(items)) => ApiError::Validation(
                items
                    .into_iter()
                    .map(|item| item.into_validation_error())
                    .collect(),
            ),
            Some(Detail::Message(detail)) => ApiError::Rejected { status, detail },
            None => ApiError::Malformed(format!("status {status} without a detail message")),
        }
    }

    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthenticated | ApiError::Unauthorized { .. }
        )
    }

    /// Notification text for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthenticated => SESSION_EXPIRED_MESSAGE.to_string(),
            ApiError::Unauthorized { detail } if detail.trim().is_empty() => {
                SESSION_EXPIRED_MESSAGE.to_string()
            }
            ApiError::Unauthorized { detail } => detail.clone(),
            ApiError::Validation(errors) => aggregate_message(errors),
            ApiError::Rejected { detail, .. } => detail.clone(),
            ApiError::Transport(_) | ApiError::Malformed(_) => GENERIC_MESSAGE.to_string(),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_422_maps_to_field_paths() {
        let body = r#"{"detail":[{"loc":["body","user","birthday"],"msg":"invalid date","type":"value_error"}]}"#;
        let err = ApiError::from_status(422, body);
        assert_eq!(
            err,
            ApiError::Validation(vec![ValidationError::new("user.birthday", "invalid date")])
        );
        assert_eq!(err.user_message(), "user.birthday: invalid date");
    }

    #[test]
    fn numeric_loc_segments_are_kept() {
        let body = r#"{"detail":[{"loc":["body","items",0,"name"],"msg":"required"}]}"#;
        assert_eq!(
            ApiError::from_status(422, body).user_message(),
            "items.0.name: required"
        );
    }

    #[test]
    fn string_detail_is_surfaced_verbatim() {
        let body = r#"{"detail":"Username already exists"}"#;
        let err = ApiError::from_status(400, body);
        assert_eq!(
            err,
            ApiError::Rejected {
                status: 400,
                detail: "Username already exists".into()
            }
        );
        assert_eq!(err.user_message(), "Username already exists");

        assert!(matches!(
            ApiError::from_status(422, r#"{"detail":"bad range"}"#),
            ApiError::Rejected { status: 422, .. }
        ));
    }

    #[test]
    fn unauthorized_and_missing_detail() {
        let err = ApiError::from_status(401, "");
        assert!(err.is_auth_failure());
        assert_eq!(err.user_message(), SESSION_EXPIRED_MESSAGE);

        let err = ApiError::from_status(500, "<html>oops</html>");
        assert!(matches!(err, ApiError::Malformed(_)));
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
    }

    #[test]
    fn transport_errors_use_generic_message() {
        let err = ApiError::from(TransportError::Timeout);
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
    }
}
