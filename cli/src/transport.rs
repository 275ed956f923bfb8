//! `Transport` backed by an async reqwest client.

use std::time::Duration;

use reqwest::{Client, Method};
use taskboard_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};
use tracing::debug;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("taskboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn convert_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl Transport for ReqwestTransport {
    /// Any HTTP status comes back as `Ok`; only connection-level failures
    /// become `ApiError::Transport`.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.path, "executing request");

        let mut builder = self.client.request(Self::convert_method(request.method), &request.path);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        debug!(status, "response received");
        Ok(HttpResponse { status, headers, body })
    }
}
