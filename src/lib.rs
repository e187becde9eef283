//! Client-side bindings for a remote tool catalog.
//!
//! This crate implements:
//! - A schema model for the YAML manifest a toolbox service serves
//! - Classification of declared parameters into auth-required, bound
//!   and caller-supplied sets
//! - Immutable [`ToolboxTool`] instances with copy-on-modify auth token
//!   registration and parameter binding
//! - An invocation path that validates auth completeness and argument
//!   shape before dispatching over HTTP
//! - [`ToolboxClient`] for loading single tools or whole toolsets
//!
//! ```no_run
//! use toolbox_client::ToolboxClient;
//!
//! # async fn run() -> toolbox_client::Result<()> {
//! let client = ToolboxClient::new("https://toolbox.example.com:5000");
//! let tool = client.load_tool("search-rows").await?;
//! let tool = tool.add_auth_token("google", || "id-token".to_string(), true)?;
//! let result = tool.invoke(serde_json::Map::new()).await?;
//! # Ok(())
//! # }
//! ```


mod auth;
mod classify;
mod transport;

pub mod client;
pub mod tool;
pub mod types;

pub use client::ToolboxClient;
pub use tool::ToolboxTool;
pub use types::{
    AuthTokenRegistry, BoundParamRegistry, BoundValue, Error, ManifestSchema, ParamType,
    ParameterSchema, Result, TokenGetter, ToolSchema,
};

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Interface an embedding agent framework consumes: a named, described
/// operation with a JSON-schema argument shape and an async entry point.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON-schema object describing the arguments a caller supplies.
    fn args_schema(&self) -> Value;

    /// Invokes the tool with the given arguments.
    async fn call(&self, args: Map<String, Value>) -> Result<Value>;
}

#[async_trait]
impl AgentTool for ToolboxTool {
    fn name(&self) -> &str {
        self.name()
    }

    fn description(&self) -> &str {
        self.description()
    }

    fn args_schema(&self) -> Value {
        ToolboxTool::args_schema(self)
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value> {
        self.invoke(args).await
    }
}
