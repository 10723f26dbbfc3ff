//! Response and request bodies shared by several endpoints.

use serde::{Deserialize, Serialize};

use admin_core::model::ValidationError;

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Detail>,
}

/// `detail` is either a plain message or a list of field complaints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Detail {
    Message(String),
    Items(Vec<DetailItem>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailItem {
    #[serde(default)]
    pub loc: Vec<LocSegment>,
    pub msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LocSegment {
    Name(String),
    Index(i64),
}

impl LocSegment {
    fn render(&self) -> String {
        match self {
            LocSegment::Name(name) => name.clone(),
            LocSegment::Index(index) => index.to_string(),
        }
    }
}

impl DetailItem {
    pub fn into_validation_error(self) -> ValidationError {
        let loc: Vec<String> = self.loc.iter().map(LocSegment::render).collect();
        ValidationError::from_loc(&loc, self.msg)
    }
}

/// `{detail: string}` returned by batch and assignment endpoints on success.
#[derive(Debug, Deserialize)]
pub(crate) struct DetailMessage {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}
