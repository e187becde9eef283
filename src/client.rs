//! Entry point for loading tools from a toolbox service.

use std::sync::Arc;

use crate::tool::ToolboxTool;
use crate::transport;
use crate::types::{
    AuthTokenRegistry, BoundParamRegistry, BoundValue, Error, ManifestSchema, Result,
    TokenGetter, ToolSchema,
};

/// Client for a toolbox service.
///
/// Holds the service base URL, a shared HTTP client handed to every
/// loaded tool, and client-level default auth tokens and bound
/// parameters applied to every tool loaded after they are registered.
pub struct ToolboxClient {
    url: String,
    http: reqwest::Client,
    auth_tokens: AuthTokenRegistry,
    bound_params: BoundParamRegistry,
}

impl ToolboxClient {
    /// Creates a client for the service at `url` with a fresh HTTP
    /// client.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    /// Creates a client that reuses a caller-owned HTTP client, e.g. to
    /// share connection pools or proxy settings across clients.
    pub fn with_client(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http,
            auth_tokens: AuthTokenRegistry::new(),
            bound_params: BoundParamRegistry::new(),
        }
    }

    /// Registers a default token getter for an auth source, applied to
    /// every tool loaded after this call.
    pub fn add_auth_token(
        &mut self,
        source: impl Into<String>,
        get_token: impl Fn() -> String + Send + Sync + 'static,
    ) {
        self.auth_tokens
            .insert(source.into(), Arc::new(get_token) as TokenGetter);
    }

    /// Registers a default bound parameter, applied to every tool
    /// loaded after this call that declares a matching plain parameter.
    pub fn add_bound_param(&mut self, name: impl Into<String>, value: impl Into<BoundValue>) {
        self.bound_params.insert(name.into(), value.into());
    }

    /// Loads a single tool using the client-level defaults and strict
    /// conflict checking.
    pub async fn load_tool(&self, tool_name: &str) -> Result<ToolboxTool> {
        self.load_tool_with(
            tool_name,
            AuthTokenRegistry::new(),
            BoundParamRegistry::new(),
            true,
        )
        .await
    }

    /// Loads a single tool with additional auth tokens and bound
    /// parameters. Per-load entries win over client-level defaults on
    /// the same key.
    pub async fn load_tool_with(
        &self,
        tool_name: &str,
        auth_tokens: AuthTokenRegistry,
        bound_params: BoundParamRegistry,
        strict: bool,
    ) -> Result<ToolboxTool> {
        let manifest = self.load_tool_manifest(tool_name).await?;
        let schema = manifest
            .tools
            .get(tool_name)
            .cloned()
            .ok_or_else(|| Error::ToolNotFound {
                name: tool_name.to_string(),
            })?;
        self.build_tool(tool_name, schema, &auth_tokens, &bound_params, strict)
    }

    /// Loads every tool in a toolset, or all tools when no toolset name
    /// is given, using the client-level defaults and strict conflict
    /// checking.
    pub async fn load_toolset(&self, toolset_name: Option<&str>) -> Result<Vec<ToolboxTool>> {
        self.load_toolset_with(
            toolset_name,
            AuthTokenRegistry::new(),
            BoundParamRegistry::new(),
            true,
        )
        .await
    }

    /// Loads every tool in a toolset with additional auth tokens and
    /// bound parameters.
    pub async fn load_toolset_with(
        &self,
        toolset_name: Option<&str>,
        auth_tokens: AuthTokenRegistry,
        bound_params: BoundParamRegistry,
        strict: bool,
    ) -> Result<Vec<ToolboxTool>> {
        let manifest = self.load_toolset_manifest(toolset_name).await?;
        manifest
            .tools
            .into_iter()
            .map(|(name, schema)| self.build_tool(&name, schema, &auth_tokens, &bound_params, strict))
            .collect()
    }

    async fn load_tool_manifest(&self, tool_name: &str) -> Result<ManifestSchema> {
        let url = format!("{}/api/tool/{}", self.url, tool_name);
        transport::load_manifest(&self.http, &url).await
    }

    async fn load_toolset_manifest(&self, toolset_name: Option<&str>) -> Result<ManifestSchema> {
        let url = format!("{}/api/toolset/{}", self.url, toolset_name.unwrap_or(""));
        transport::load_manifest(&self.http, &url).await
    }

    fn build_tool(
        &self,
        name: &str,
        schema: ToolSchema,
        auth_tokens: &AuthTokenRegistry,
        bound_params: &BoundParamRegistry,
        strict: bool,
    ) -> Result<ToolboxTool> {
        // Per-load entries win; client-level defaults fill the gaps.
        let mut tokens = auth_tokens.clone();
        for (source, get_token) in &self.auth_tokens {
            tokens
                .entry(source.clone())
                .or_insert_with(|| get_token.clone());
        }
        // Client-level bound defaults only apply where the tool
        // declares a matching plain parameter; other tools in the same
        // toolset must keep loading cleanly.
        let mut bound = bound_params.clone();
        for (param_name, value) in &self.bound_params {
            let declared_plain = schema
                .parameters
                .iter()
                .any(|p| p.name == *param_name && !p.requires_auth());
            if declared_plain {
                bound
                    .entry(param_name.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        ToolboxTool::new(
            name,
            schema,
            self.url.clone(),
            self.http.clone(),
            tokens,
            bound,
            strict,
        )
    }
}

impl std::fmt::Debug for ToolboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolboxClient")
            .field("url", &self.url)
            .field("auth_sources", &self.auth_tokens.keys().collect::<Vec<_>>())
            .field("bound_params", &self.bound_params.keys().collect::<Vec<_>>())
            .finish()
    }
}
