use std::ops::RangeInclusive;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::query::PageSize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEBOUNCE_RANGE_MS: RangeInclusive<u64> = 300..=500;

pub const ENV_BASE_URL: &str = "DRIVE_ADMIN_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "DRIVE_ADMIN_TIMEOUT_SECS";
pub const ENV_DEBOUNCE_MS: &str = "DRIVE_ADMIN_DEBOUNCE_MS";
pub const ENV_PAGE_SIZE: &str = "DRIVE_ADMIN_PAGE_SIZE";

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    base_url: Url,
    timeout: Duration,
    debounce: Duration,
    page_size: PageSize,
}

/// Raw, possibly incomplete settings as read from the environment or flags.
#[derive(Clone, Debug, Default)]
pub struct ClientSettingsDraft {
    pub base_url: Option<String>,
    pub timeout_secs: Option<String>,
    pub debounce_ms: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("request timeout must be a positive number of seconds (got {0})")]
    InvalidTimeout(String),

    #[error("search debounce must be between 300 and 500 ms (got {0})")]
    InvalidDebounce(String),

    #[error("page size must be one of 10, 25, 50, 100 (got {0})")]
    InvalidPageSize(String),
}

impl ClientSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the draft from `DRIVE_ADMIN_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(ENV_BASE_URL).ok(),
            timeout_secs: std::env::var(ENV_TIMEOUT_SECS).ok(),
            debounce_ms: std::env::var(ENV_DEBOUNCE_MS).ok(),
            page_size: std::env::var(ENV_PAGE_SIZE).ok(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Normalize and validate the draft, filling defaults for blank values.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` naming the first value that fails to parse or
    /// falls outside its allowed range.
    pub fn validate(self) -> Result<ClientSettings, SettingsError> {
        let base_url = normalize_optional(self.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url =
            Url::parse(&base_url).map_err(|_| SettingsError::InvalidBaseUrl(base_url.clone()))?;

        let timeout_secs = match normalize_optional(self.timeout_secs) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(SettingsError::InvalidTimeout(raw)),
            },
        };

        let debounce_ms = match normalize_optional(self.debounce_ms) {
            None => DEFAULT_DEBOUNCE_MS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if DEBOUNCE_RANGE_MS.contains(&ms) => ms,
                _ => return Err(SettingsError::InvalidDebounce(raw)),
            },
        };

        let page_size = match normalize_optional(self.page_size) {
            None => PageSize::default(),
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .and_then(|size| PageSize::try_from(size).ok())
                .ok_or(SettingsError::InvalidPageSize(raw))?,
        };

        Ok(ClientSettings {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            debounce: Duration::from_millis(debounce_ms),
            page_size,
        })
    }
}

impl ClientSettings {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    #[must_use]
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_uses_defaults() {
        let settings = ClientSettingsDraft::new().validate().unwrap();
        assert_eq!(settings.base_url().as_str(), "http://localhost:8000/");
        assert_eq!(settings.timeout(), Duration::from_secs(10));
        assert_eq!(settings.debounce(), Duration::from_millis(400));
        assert_eq!(settings.page_size(), PageSize::Ten);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let draft = ClientSettingsDraft {
            base_url: Some("   ".into()),
            timeout_secs: Some(String::new()),
            ..ClientSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap(),
            ClientSettingsDraft::new().validate().unwrap()
        );
    }

    #[test]
    fn rejects_bad_values() {
        let bad_url = ClientSettingsDraft::new().with_base_url("not a url");
        assert!(matches!(bad_url.validate(), Err(SettingsError::InvalidBaseUrl(_))));

        let zero_timeout = ClientSettingsDraft {
            timeout_secs: Some("0".into()),
            ..ClientSettingsDraft::default()
        };
        assert_eq!(
            zero_timeout.validate(),
            Err(SettingsError::InvalidTimeout("0".into()))
        );

        let fast_debounce = ClientSettingsDraft {
            debounce_ms: Some("120".into()),
            ..ClientSettingsDraft::default()
        };
        assert_eq!(
            fast_debounce.validate(),
            Err(SettingsError::InvalidDebounce("120".into()))
        );

        let odd_page = ClientSettingsDraft {
            page_size: Some("30".into()),
            ..ClientSettingsDraft::default()
        };
        assert_eq!(
            odd_page.validate(),
            Err(SettingsError::InvalidPageSize("30".into()))
        );
    }

    #[test]
    fn accepts_explicit_values() {
        let settings = ClientSettingsDraft {
            base_url: Some(" https://school.example.org ".into()),
            timeout_secs: Some("30".into()),
            debounce_ms: Some("300".into()),
            page_size: Some("50".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(settings.base_url().host_str(), Some("school.example.org"));
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.debounce(), Duration::from_millis(300));
        assert_eq!(settings.page_size(), PageSize::Fifty);
    }
}
