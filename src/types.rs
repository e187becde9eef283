//! Shared types: the manifest schema model, bound-value union and error
//! taxonomy used across the crate.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Value types a tool parameter can declare in the manifest.
///
/// The names match both the manifest format and JSON schema, so they can
/// be passed through to agent frameworks unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
        }
    }

    /// Whether a JSON value conforms to this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parameter declared by a tool in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub description: String,
    /// Identity providers whose tokens may satisfy this parameter. A
    /// present, non-empty list means the service fills the value from a
    /// validated token and the caller never supplies it.
    #[serde(rename = "authSources", default)]
    pub auth_sources: Option<Vec<String>>,
}

impl ParameterSchema {
    pub fn requires_auth(&self) -> bool {
        self.auth_sources
            .as_ref()
            .is_some_and(|sources| !sources.is_empty())
    }
}

/// Declared interface of a single tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSchema {
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSchema>,
}

/// Top-level manifest served by the toolbox service.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSchema {
    #[serde(rename = "serverVersion")]
    pub server_version: String,
    pub tools: BTreeMap<String, ToolSchema>,
}

/// Zero-argument function producing a fresh ID token for one auth source.
pub type TokenGetter = Arc<dyn Fn() -> String + Send + Sync>;

/// Registered token getters, keyed by auth source name. Owned by a single
/// tool instance and only ever extended by merge-copy.
pub type AuthTokenRegistry = HashMap<String, TokenGetter>;

/// A value bound to a parameter ahead of invocation.
///
/// `Deferred` suppliers are re-evaluated on every call, which supports
/// values that change between invocations such as rotating credentials or
/// timestamps.
#[derive(Clone)]
pub enum BoundValue {
    Literal(Value),
    Deferred(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl BoundValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        BoundValue::Literal(value.into())
    }

    pub fn deferred<F>(supplier: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        BoundValue::Deferred(Arc::new(supplier))
    }

    /// Produces the current value, evaluating a deferred supplier.
    pub fn resolve(&self) -> Value {
        match self {
            BoundValue::Literal(value) => value.clone(),
            BoundValue::Deferred(supplier) => supplier(),
        }
    }
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            BoundValue::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<Value> for BoundValue {
    fn from(value: Value) -> Self {
        BoundValue::Literal(value)
    }
}

/// Bound parameter values, keyed by parameter name. Same ownership and
/// copy discipline as [`AuthTokenRegistry`].
pub type BoundParamRegistry = HashMap<String, BoundValue>;

/// Errors surfaced by the client and its tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bound parameters that target an authenticated parameter or name
    /// nothing in the tool's schema.
    #[error("Invalid bindings for tool `{tool}`:\n{message}")]
    InvalidBinding { tool: String, message: String },

    #[error("Authentication source(s) `{}` already registered in tool `{tool}`", .sources.join(", "))]
    DuplicateAuthSource { tool: String, sources: Vec<String> },

    #[error("Parameter(s) `{}` already bound in tool `{tool}`", .params.join(", "))]
    DuplicateBoundParam { tool: String, params: Vec<String> },

    #[error(
        "Parameter(s) `{}` of tool `{tool}` require authentication, but no valid \
         authentication sources are registered",
        .params.join(", ")
    )]
    MissingAuth { tool: String, params: Vec<String> },

    #[error("Arguments for tool `{tool}` do not match its schema: {}", .issues.join("; "))]
    SchemaValidation { tool: String, issues: Vec<String> },

    #[error("Tool `{name}` not found in manifest")]
    ToolNotFound { name: String },

    #[error("Server returned {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_type_matches_json_values() {
        assert!(ParamType::String.matches(&json!("hi")));
        assert!(ParamType::Integer.matches(&json!(3)));
        assert!(!ParamType::Integer.matches(&json!(3.5)));
        assert!(ParamType::Number.matches(&json!(3.5)));
        assert!(ParamType::Number.matches(&json!(3)));
        assert!(ParamType::Boolean.matches(&json!(true)));
        assert!(ParamType::Array.matches(&json!([1, 2])));
        assert!(!ParamType::String.matches(&json!(null)));
    }

    #[test]
    fn empty_auth_sources_is_not_auth_required() {
        let param: ParameterSchema = serde_yaml::from_str(
            "name: row_id\ntype: string\ndescription: id\nauthSources: []\n",
        )
        .unwrap();
        assert!(!param.requires_auth());

        let param: ParameterSchema = serde_yaml::from_str(
            "name: user_id\ntype: string\ndescription: id\nauthSources: [google]\n",
        )
        .unwrap();
        assert!(param.requires_auth());
    }

    #[test]
    fn deferred_values_are_reevaluated() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let counter = Arc::new(AtomicU64::new(0));
        let counter_clone = counter.clone();
        let value =
            BoundValue::deferred(move || json!(counter_clone.fetch_add(1, Ordering::SeqCst)));
        assert_eq!(value.resolve(), json!(0));
        assert_eq!(value.resolve(), json!(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn manifest_parses_from_yaml() {
        let yaml = r#"
serverVersion: 0.0.1
tools:
  search-rows:
    description: Search rows in a table.
    parameters:
      - name: query
        type: string
        description: Search query.
"#;
        let manifest: ManifestSchema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.server_version, "0.0.1");
        let tool = &manifest.tools["search-rows"];
        assert_eq!(tool.parameters.len(), 1);
        assert_eq!(tool.parameters[0].param_type, ParamType::String);
    }
}
