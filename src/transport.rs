//! HTTP collaborators: manifest fetching and remote tool invocation.
//!
//! Retry policy is deliberately out of scope; failures are surfaced
//! unchanged for the caller to handle.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::types::{Error, ManifestSchema, Result};

/// Fetches a YAML manifest from `url` and parses it.
pub(crate) async fn load_manifest(http: &reqwest::Client, url: &str) -> Result<ManifestSchema> {
    debug!(%url, "fetching tool manifest");

    let response = http.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(Error::Api {
            status,
            message: body,
        });
    }

    Ok(serde_yaml::from_str(&body)?)
}

/// Invokes a tool over HTTP, passing resolved ID tokens as request
/// headers, and returns the parsed JSON response body.
pub(crate) async fn invoke_tool(
    http: &reqwest::Client,
    base_url: &str,
    tool_name: &str,
    args: &Map<String, Value>,
    token_headers: &HashMap<String, String>,
) -> Result<Value> {
    let url = format!("{base_url}/api/tool/{tool_name}/invoke");
    debug!(%url, tool = tool_name, "invoking tool");

    // ID tokens carry user claims; sending them in the clear exposes
    // them to anyone on the path.
    if !token_headers.is_empty() && !url.starts_with("https://") {
        warn!("sending ID tokens over plain HTTP; use HTTPS to protect user data");
    }

    let mut request = http.post(&url).json(args);
    for (name, value) in token_headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(Error::Api {
            status,
            message: body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
