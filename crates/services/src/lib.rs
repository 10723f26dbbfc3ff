#![forbid(unsafe_code)]

pub mod assignment;
pub mod batch;
pub mod browser;
pub mod catalog;
pub mod chain;
pub mod debounce;
pub mod error;
pub mod fetcher;
pub mod form;
pub mod notify;
pub mod options;
pub mod schedule_viewer;
pub mod sequence;
pub mod view;

pub use admin_core::Clock;

pub use assignment::{AssignmentRow, CategoryAssignment};
pub use batch::{BatchActionController, BatchPhase};
pub use browser::ResourceBrowser;
pub use catalog::{
    CategoryLevels, Cabinets, Groups, Instructors, ListMode, Resource, ResourceConfig, Students,
    Vehicles,
};
pub use chain::{CascadeReport, DependentSelectionChain, SelectionStore};
pub use debounce::SearchDebouncer;
pub use error::{
    AssignmentError, BatchError, BrowserError, ChainError, FormError, ScheduleViewerError,
};
pub use fetcher::{FetchOutcome, ResourceFetcher, ResourcePage};
pub use form::{FormController, FormPhase};
pub use notify::{Notification, NotificationLevel, NotificationLog, Notifier, TracingNotifier};
pub use options::{LoadOutcome, OptionCache, OptionKey};
pub use schedule_viewer::ScheduleViewer;
pub use sequence::{SequenceGate, Ticket};
pub use view::{ListView, PaginationVm, ViewState};
