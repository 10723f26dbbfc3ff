use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::session::{Session, SessionContext};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::wire::{DetailMessage, LoginRequest, TokenResponse};

/// Typed access to the backend's path grammar.
///
/// Every call reads the bearer credential from the shared `SessionContext`;
/// without a session nothing is sent and `ApiError::Unauthenticated` is
/// returned. Nothing is retried.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionContext,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, session: SessionContext) -> Self {
        Self { transport, session }
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// `POST /api/auth/login`; stores the session on success.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for rejected credentials or transport failures.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let body = serde_json::to_value(LoginRequest { username, password })
            .map_err(|err| ApiError::Malformed(err.to_string()))?;
        let response = self
            .dispatch(ApiRequest::post("/api/auth/login", body))
            .await?;
        let token: TokenResponse = decode(&response)?;
        let session = Session::from_token(token.access_token);
        info!(role = ?session.role(), "signed in");
        self.session.sign_in(session.clone());
        Ok(session)
    }

    pub fn logout(&self) {
        self.session.sign_out();
        info!("signed out");
    }

    /// `GET /api/{resource}/paginated?...`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for missing sessions, non-2xx statuses, transport
    /// failures and bodies that do not decode.
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: Vec<(String, String)>,
    ) -> Result<Vec<T>, ApiError> {
        let request = ApiRequest::get(format!("/api/{resource}/paginated")).with_query(params);
        self.send_json(request).await
    }

    /// `GET /api/{resource}/` (unpaginated collection).
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list_page`].
    pub async fn list_all<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/{resource}/")))
            .await
    }

    /// `GET /api/{path}` for dependent option collections such as
    /// `category_levels/3/groups`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list_page`].
    pub async fn fetch_collection<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/{path}")))
            .await
    }

    /// `GET /api/{path}?{query}` for per-entity collections such as
    /// `students/4/schedule?dt=2025-05-02`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list_page`].
    pub async fn fetch_collection_at<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Vec<T>, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/{path}")).with_query(query))
            .await
    }

    /// `POST /api/{resource}/`
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` for structured 422s; see [`ApiClient::list_page`].
    pub async fn create(&self, resource: &str, body: Value) -> Result<Value, ApiError> {
        let response = self
            .send(ApiRequest::post(format!("/api/{resource}/"), body))
            .await?;
        decode_or_null(&response)
    }

    /// `PUT /api/{resource}/{id}`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::create`].
    pub async fn update(&self, resource: &str, id: u64, body: Value) -> Result<Value, ApiError> {
        let response = self
            .send(ApiRequest::put(format!("/api/{resource}/{id}"), body))
            .await?;
        decode_or_null(&response)
    }

    /// `POST /api/{endpoint}` returning the `detail` message of a batch
    /// action.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::create`].
    pub async fn post_action(&self, endpoint: &str, body: Value) -> Result<String, ApiError> {
        let response = self
            .send(ApiRequest::post(format!("/api/{endpoint}"), body))
            .await?;
        decode_detail(&response)
    }

    /// `POST /api/{path}?{query}` without a body, returning `detail`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::create`].
    pub async fn post_query(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<String, ApiError> {
        let request = ApiRequest::new(Method::Post, format!("/api/{path}"))
            .with_query(query);
        let response = self.send(request).await?;
        decode_detail(&response)
    }

    /// `DELETE /api/{path}`, returning `detail`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::create`].
    pub async fn delete(&self, path: &str) -> Result<String, ApiError> {
        let response = self
            .send(ApiRequest::delete(format!("/api/{path}")))
            .await?;
        decode_detail(&response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        decode(&response)
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let session = self.session.current().ok_or(ApiError::Unauthenticated)?;
        self.dispatch(request.with_bearer(session.token())).await
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, query = ?request.query, "sending request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, %path, error = %err, "request failed");
                return Err(err.into());
            }
        };

        if response.is_success() {
            debug!(%method, %path, status = response.status, "request succeeded");
            Ok(response)
        } else {
            let err = ApiError::from_status(response.status, &response.body);
            warn!(%method, %path, status = response.status, error = %err, "request rejected");
            Err(err)
        }
    }
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|err| ApiError::Malformed(err.to_string()))
}

fn decode_or_null(response: &ApiResponse) -> Result<Value, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    decode(response)
}

fn decode_detail(response: &ApiResponse) -> Result<String, ApiError> {
    decode::<DetailMessage>(response).map(|message| message.detail)
}
