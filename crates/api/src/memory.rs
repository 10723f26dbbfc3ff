//! Scripted in-memory backend for tests and offline prototyping.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};

/// What a scripted route answers, and how long it takes.
#[derive(Clone, Debug)]
pub struct Reply {
    pub outcome: Result<ApiResponse, TransportError>,
    pub delay: Duration,
}

impl Reply {
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            outcome: Ok(ApiResponse::json(status, &body)),
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    #[must_use]
    pub fn detail(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "detail": message }))
    }

    #[must_use]
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(ApiResponse::new(status, body)),
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn connection_failure(message: &str) -> Self {
        Self {
            outcome: Err(TransportError::Connection(message.to_string())),
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = Arc<dyn Fn(&ApiRequest) -> Reply + Send + Sync>;

struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// `Transport` answering from registered routes.
///
/// Routes match on method and exact path; the most recently registered match
/// wins. Unmatched requests get a 404 with `{"detail": "Not Found"}`. Every
/// request is logged before it is answered.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    routes: Arc<Mutex<Vec<Route>>>,
    log: Arc<Mutex<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests with a handler that can inspect query and body.
    pub fn route<F>(&self, method: Method, path: impl Into<String>, handler: F)
    where
        F: Fn(&ApiRequest) -> Reply + Send + Sync + 'static,
    {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        routes.push(Route {
            method,
            path: path.into(),
            handler: Arc::new(handler),
        });
    }

    /// Answer requests with a fixed reply.
    pub fn reply(&self, method: Method, path: impl Into<String>, reply: Reply) {
        self.route(method, path, move |_| reply.clone());
    }

    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path == path)
            .collect()
    }

    pub fn clear_log(&self) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn handler_for(&self, method: Method, path: &str) -> Option<Handler> {
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        routes
            .iter()
            .rev()
            .find(|route| route.method == method && route.path == path)
            .map(|route| Arc::clone(&route.handler))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = match self.handler_for(request.method, &request.path) {
            Some(handler) => handler(&request),
            None => Reply::detail(404, "Not Found"),
        };
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.outcome
    }
}
