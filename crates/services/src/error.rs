//! Shared error types for the services crate.

use thiserror::Error;

use admin_core::model::{ScheduleError, ScheduleOwner};
use admin_core::query::QueryError;
use admin_core::schema::DraftError;
use api::ApiError;

/// Errors emitted while building a dependency graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChainError {
    #[error("dependency cycle through `{0}`")]
    Cycle(String),
}

/// Errors emitted by `ResourceBrowser`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BrowserError {
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),
    #[error("unknown sort key `{0}`")]
    UnknownSortKey(String),
    #[error("already on the first page")]
    NoPreviousPage,
    #[error("no further pages")]
    NoNextPage,
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `FormController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormError {
    #[error("no form is open")]
    NotOpen,
    #[error("a submission is already in flight")]
    Busy,
    #[error("row {0} is not on the current page")]
    RowNotFound(u64),
    #[error("{0}")]
    MissingSelection(&'static str),
    #[error("could not read row: {0}")]
    Seed(String),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `BatchActionController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BatchError {
    #[error("no batch action is open")]
    NotOpen,
    #[error("a batch action is already in flight")]
    Busy,
    #[error("rows of this resource have no batch action")]
    Unsupported,
    #[error("row {0} is not on the current page")]
    RowNotFound(u64),
    #[error(transparent)]
    Invalid(#[from] ScheduleError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `CategoryAssignment`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssignmentError {
    #[error("category level {0} is not offered")]
    UnknownCategory(u64),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `ScheduleViewer`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScheduleViewerError {
    #[error("{owner} {id} is not in the loaded list")]
    UnknownEntity { owner: ScheduleOwner, id: u64 },
    #[error(transparent)]
    Api(#[from] ApiError),
}
