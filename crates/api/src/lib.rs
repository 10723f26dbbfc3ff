#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod session;
pub mod transport;
mod wire;

pub use client::ApiClient;
pub use error::ApiError;
pub use http::HttpTransport;
pub use memory::ScriptedTransport;
pub use session::{Role, Session, SessionContext};
pub use transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
