//! Endpoint test configuration
//!
//! The config file is an ordered JSON array of endpoint descriptors:
//!
//! ```json
//! [
//!   {"method": "GET", "path": "/users/1"},
//!   {"method": "POST", "path": "/users", "body": {"name": "Alice"}},
//!   {"path": "/search", "params": {"q": "alice"}}
//! ]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CompareError, CompareResult};

/// One declarative test case: a request replayed against both servers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// HTTP method, defaults to GET when absent
    #[serde(default = "default_method")]
    pub method: String,

    /// Request path, resolved against each server's base URL
    pub path: String,

    /// Optional JSON request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Optional extra request headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    /// Optional query parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, String>>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl EndpointSpec {
    /// A GET endpoint with no body, headers or params
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: default_method(),
            path: path.into(),
            body: None,
            headers: None,
            params: None,
        }
    }
}

/// Load the ordered endpoint list from a JSON config file
pub fn load_endpoints(path: impl AsRef<Path>) -> CompareResult<Vec<EndpointSpec>> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| CompareError::ReadConfig {
        path: path.to_path_buf(),
        source: e,
    })?;

    let endpoints: Vec<EndpointSpec> =
        serde_json::from_str(&content).map_err(|e| CompareError::ParseConfig {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!("loaded {} endpoint specs from {}", endpoints.len(), path.display());
    Ok(endpoints)
}
