use std::sync::{Arc, PoisonError, RwLock};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Instructor,
    Admin,
    Unknown,
}

impl Role {
    #[must_use]
    pub fn from_claim(claim: &str) -> Self {
        match claim {
            "student_role" => Role::Student,
            "instructor_role" => Role::Instructor,
            "admin_role" => Role::Admin,
            _ => Role::Unknown,
        }
    }
}

/// Bearer credential plus the role read from its claims.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    role: Role,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl Session {
    /// Wrap a bearer token, reading the `role` claim from its payload.
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let role = decode_role(&token).unwrap_or(Role::Unknown);
        Self { token, role }
    }

    #[must_use]
    pub fn with_role(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

#[derive(Deserialize)]
struct Claims {
    role: Option<String>,
}

fn decode_role(token: &str) -> Option<Role> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    claims.role.as_deref().map(Role::from_claim)
}

/// Process-wide session holder, acquired at login and cleared at logout.
///
/// Cloned into every component that issues requests; clones share state.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        let context = Self::new();
        context.sign_in(session);
        context
    }

    pub fn sign_in(&self, session: Session) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(session);
    }

    pub fn sign_out(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn role_is_read_from_token_payload() {
        let session = Session::from_token(token_with(r#"{"sub":"boss","role":"admin_role"}"#));
        assert_eq!(session.role(), Role::Admin);

        let session = Session::from_token(token_with(r#"{"sub":"ivan","role":"student_role"}"#));
        assert_eq!(session.role(), Role::Student);
    }

    #[test]
    fn unreadable_tokens_have_unknown_role() {
        assert_eq!(Session::from_token("opaque").role(), Role::Unknown);
        assert_eq!(Session::from_token(token_with("{}")).role(), Role::Unknown);
    }

    #[test]
    fn context_clones_share_state() {
        let context = SessionContext::new();
        let clone = context.clone();
        assert!(clone.current().is_none());

        context.sign_in(Session::with_role("t", Role::Instructor));
        assert_eq!(clone.current().map(|s| s.role()), Some(Role::Instructor));

        clone.sign_out();
        assert!(context.current().is_none());
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", Session::with_role("secret-token", Role::Admin));
        assert!(!rendered.contains("secret-token"));
    }
}
