use thiserror::Error;

use crate::model::{ParseIdError, ScheduleError};
use crate::query::QueryError;
use crate::schema::DraftError;
use crate::settings::SettingsError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
