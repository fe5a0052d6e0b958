//! HTTP client for issuing identical requests to both servers

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::config::EndpointSpec;
use crate::error::{CompareError, CompareResult};

/// Timeout applied to every request on both servers
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client bound to one server's base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    base: String,
    name: String,
}

/// Everything captured from one response that comparison needs
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    /// Parsed JSON body, `None` when the raw body is not valid JSON
    pub body: Option<Value>,
    pub raw_body: String,
}

impl ApiClient {
    /// Create a client for one side of the comparison
    ///
    /// `name` identifies the side ("reference" or "candidate") in logs and
    /// transport error messages. Trailing slashes on the base URL are
    /// stripped before parsing.
    pub fn new(name: &str, base_url: &str) -> CompareResult<Self> {
        let base = base_url.trim_end_matches('/').to_string();
        let base_url = Url::parse(&base).map_err(|e| CompareError::InvalidBaseUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CompareError::BuildClient { source: e })?;

        Ok(Self {
            client,
            base_url,
            base,
            name: name.to_string(),
        })
    }

    /// The normalized base URL this client was created with
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The side name (for logging)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Issue the request described by `spec` and capture the response
    pub async fn execute(&self, spec: &EndpointSpec) -> CompareResult<ApiResponse> {
        let method = Method::from_bytes(spec.method.to_uppercase().as_bytes()).map_err(|_| {
            CompareError::InvalidRequest {
                method: spec.method.clone(),
                path: spec.path.clone(),
                reason: format!("unsupported HTTP method '{}'", spec.method),
            }
        })?;

        let url =
            self.base_url
                .join(&spec.path)
                .map_err(|e| CompareError::InvalidRequest {
                    method: spec.method.clone(),
                    path: spec.path.clone(),
                    reason: format!("cannot resolve against {}: {}", self.base, e),
                })?;

        debug!("{}: {} {}", self.name, method, url);

        let mut request = self.client.request(method, url);

        if let Some(params) = &spec.params {
            request = request.query(params);
        }

        if let Some(headers) = &spec.headers {
            for (key, value) in headers {
                let header_name =
                    HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                        CompareError::InvalidRequest {
                            method: spec.method.clone(),
                            path: spec.path.clone(),
                            reason: format!("invalid header name '{key}'"),
                        }
                    })?;
                let header_value =
                    HeaderValue::from_str(value).map_err(|_| CompareError::InvalidRequest {
                        method: spec.method.clone(),
                        path: spec.path.clone(),
                        reason: format!("invalid value for header '{key}'"),
                    })?;
                request = request.header(header_name, header_value);
            }
        }

        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| CompareError::Transport {
            server: self.name.clone(),
            source: e,
        })?;

        self.capture(response).await
    }

    async fn capture(&self, response: Response) -> CompareResult<ApiResponse> {
        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let raw_body = response.text().await.map_err(|e| CompareError::Transport {
            server: self.name.clone(),
            source: e,
        })?;
        let body = serde_json::from_str(&raw_body).ok();

        Ok(ApiResponse {
            status,
            headers,
            body,
            raw_body,
        })
    }
}

impl ApiResponse {
    /// Get a header value, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
