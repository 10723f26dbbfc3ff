use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use admin_core::settings::ClientSettings;

use crate::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};

/// `Transport` over HTTP with `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns `TransportError::InvalidRequest` if the HTTP client cannot be
    /// built.
    pub fn new(settings: &ClientSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url().clone(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, self.url_for(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = request.bearer.as_deref() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest)?;
        Ok(ApiResponse { status, body })
    }
}

fn map_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_core::settings::ClientSettingsDraft;

    #[test]
    fn url_for_joins_without_double_slash() {
        let settings = ClientSettingsDraft::new()
            .with_base_url("http://school.local:8000/")
            .validate()
            .unwrap();
        let transport = HttpTransport::new(&settings).unwrap();
        assert_eq!(
            transport.url_for("/api/students/paginated"),
            "http://school.local:8000/api/students/paginated"
        );
    }
}
