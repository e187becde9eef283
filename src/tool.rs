//! A single remote tool: parameter classification, credential and
//! binding ledgers, and the invocation path.

use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use crate::auth::{missing_auth_params, resolve_token_headers};
use crate::classify::{split_auth_params, split_bound_params};
use crate::transport;
use crate::types::{
    AuthTokenRegistry, BoundParamRegistry, BoundValue, Error, ParameterSchema, Result,
    TokenGetter, ToolSchema,
};

/// A remote tool bound to a base URL and ready to invoke.
///
/// Instances are immutable. Registering auth tokens or binding
/// parameters produces a new tool, so a base tool can be shared across
/// callers holding different credentials without interference.
#[derive(Clone)]
pub struct ToolboxTool {
    name: String,
    description: String,
    /// Full parameter list as declared in the manifest, kept so
    /// copy-on-modify can re-derive the classification from scratch.
    declared_params: Vec<ParameterSchema>,
    /// Parameters the caller must still supply.
    residual_params: Vec<ParameterSchema>,
    /// Parameters the service fills from an identity token.
    auth_params: Vec<ParameterSchema>,
    auth_tokens: AuthTokenRegistry,
    bound_params: BoundParamRegistry,
    url: String,
    http: reqwest::Client,
}

impl ToolboxTool {
    /// Builds a tool from its declared schema and the given ledgers.
    ///
    /// Bound parameters that target an auth-required parameter or name
    /// nothing in the schema are a configuration conflict: fatal when
    /// `strict`, otherwise warned about and dropped. Missing auth
    /// tokens never fail construction; they are re-checked strictly at
    /// invocation so integrators can attach credentials afterwards.
    pub(crate) fn new(
        name: impl Into<String>,
        schema: ToolSchema,
        url: impl Into<String>,
        http: reqwest::Client,
        auth_tokens: AuthTokenRegistry,
        bound_params: BoundParamRegistry,
        strict: bool,
    ) -> Result<Self> {
        let name = name.into();

        let (auth_params, plain_params) = split_auth_params(&schema.parameters);
        let bound_names: HashSet<String> = bound_params.keys().cloned().collect();
        let (bound_schemas, residual_params) = split_bound_params(&plain_params, &bound_names);

        // Bindings that target an authenticated parameter, or nothing
        // in the schema at all.
        let mut auth_bound: Vec<&str> = Vec::new();
        let mut missing_bound: Vec<&str> = Vec::new();
        for bound_name in bound_params.keys() {
            if auth_params.iter().any(|p| p.name == *bound_name) {
                auth_bound.push(bound_name.as_str());
            } else if !plain_params.iter().any(|p| p.name == *bound_name) {
                missing_bound.push(bound_name.as_str());
            }
        }
        auth_bound.sort_unstable();
        missing_bound.sort_unstable();

        let mut messages: Vec<String> = Vec::new();
        if !auth_bound.is_empty() {
            messages.push(format!(
                "Parameter(s) {} already authenticated and cannot be bound.",
                auth_bound.join(", ")
            ));
        }
        if !missing_bound.is_empty() {
            messages.push(format!(
                "Parameter(s) {} missing and cannot be bound.",
                missing_bound.join(", ")
            ));
        }
        if !messages.is_empty() {
            let message = messages.join("\n\n");
            if strict {
                return Err(Error::InvalidBinding { tool: name, message });
            }
            warn!(tool = %name, "{message}");
        }

        // Keep only bindings that resolved to a plain schema parameter,
        // so entries dropped above never reach the instance.
        let bound_params: BoundParamRegistry = bound_params
            .into_iter()
            .filter(|(bound_name, _)| bound_schemas.iter().any(|p| p.name == *bound_name))
            .collect();

        let tool = Self {
            name,
            description: schema.description,
            declared_params: schema.parameters,
            residual_params,
            auth_params,
            auth_tokens,
            bound_params,
            url: url.into(),
            http,
        };

        // Advisory only: tokens are usually registered after loading.
        tool.validate_auth(false)?;
        Ok(tool)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parameters the caller must supply when invoking, i.e. the
    /// declared parameters minus auth-required and bound ones.
    pub fn parameters(&self) -> &[ParameterSchema] {
        &self.residual_params
    }

    /// JSON-schema object describing the caller-facing arguments, in
    /// the shape agent frameworks hand to a model: one required, typed
    /// property per residual parameter.
    pub fn args_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.residual_params {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.param_type.as_str(),
                    "description": param.description,
                }),
            );
            required.push(Value::String(param.name.clone()));
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Registers token getters for new auth sources, returning a new
    /// tool. Re-registering a source is always an error, regardless of
    /// `strict`.
    pub fn add_auth_tokens(
        &self,
        tokens: impl IntoIterator<Item = (String, TokenGetter)>,
        strict: bool,
    ) -> Result<Self> {
        let tokens: AuthTokenRegistry = tokens.into_iter().collect();

        let mut dupes: Vec<String> = tokens
            .keys()
            .filter(|source| self.auth_tokens.contains_key(*source))
            .cloned()
            .collect();
        if !dupes.is_empty() {
            dupes.sort_unstable();
            return Err(Error::DuplicateAuthSource {
                tool: self.name.clone(),
                sources: dupes,
            });
        }

        let mut merged = self.auth_tokens.clone();
        merged.extend(tokens);
        self.recreate(merged, self.bound_params.clone(), strict)
    }

    /// Registers a single token getter; see [`Self::add_auth_tokens`].
    pub fn add_auth_token(
        &self,
        source: impl Into<String>,
        get_token: impl Fn() -> String + Send + Sync + 'static,
        strict: bool,
    ) -> Result<Self> {
        self.add_auth_tokens([(source.into(), Arc::new(get_token) as TokenGetter)], strict)
    }

    /// Binds values for new parameters, returning a new tool. Binding a
    /// parameter that is already bound is always an error, regardless
    /// of `strict`.
    pub fn bind_params(
        &self,
        params: impl IntoIterator<Item = (String, BoundValue)>,
        strict: bool,
    ) -> Result<Self> {
        let params: BoundParamRegistry = params.into_iter().collect();

        let mut dupes: Vec<String> = params
            .keys()
            .filter(|name| self.bound_params.contains_key(*name))
            .cloned()
            .collect();
        if !dupes.is_empty() {
            dupes.sort_unstable();
            return Err(Error::DuplicateBoundParam {
                tool: self.name.clone(),
                params: dupes,
            });
        }

        let mut merged = self.bound_params.clone();
        merged.extend(params);
        self.recreate(self.auth_tokens.clone(), merged, strict)
    }

    /// Binds a single parameter; see [`Self::bind_params`].
    pub fn bind_param(
        &self,
        name: impl Into<String>,
        value: impl Into<BoundValue>,
        strict: bool,
    ) -> Result<Self> {
        self.bind_params([(name.into(), value.into())], strict)
    }

    /// Invokes the tool with the given call arguments.
    ///
    /// Auth completeness is re-checked strictly here, bound values are
    /// resolved (each exactly once) and merged over `args`, the merged
    /// set is validated against the residual schema, and the request is
    /// dispatched with one `<source>_token` header per registered auth
    /// source.
    pub async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        // Last line of defense: construction only warned about missing
        // tokens, but the call must not go out unauthenticated.
        self.validate_auth(true)?;

        let mut merged = args;
        // Bound values win on collision. Bound parameters are absent
        // from the caller-facing schema, so a collision is caller error.
        for (name, value) in &self.bound_params {
            merged.insert(name.clone(), value.resolve());
        }

        self.validate_args(&merged)?;

        let token_headers = resolve_token_headers(&self.auth_tokens);
        transport::invoke_tool(&self.http, &self.url, &self.name, &merged, &token_headers).await
    }

    /// Checks that every auth-required parameter has at least one
    /// registered source. Strict failures name the tool and the
    /// unsatisfied parameters.
    fn validate_auth(&self, strict: bool) -> Result<()> {
        let missing = missing_auth_params(&self.auth_params, &self.auth_tokens);
        if missing.is_empty() {
            return Ok(());
        }
        if strict {
            return Err(Error::MissingAuth {
                tool: self.name.clone(),
                params: missing,
            });
        }
        warn!(
            tool = %self.name,
            "Parameter(s) `{}` require authentication, but no valid authentication \
             sources are registered. Register the required sources before use.",
            missing.join(", ")
        );
        Ok(())
    }

    /// Validates the merged argument map against the residual schema.
    /// Every residual parameter is required and type-checked; keys
    /// matching neither a residual nor a bound parameter are rejected.
    fn validate_args(&self, args: &Map<String, Value>) -> Result<()> {
        let mut issues: Vec<String> = Vec::new();

        for param in &self.residual_params {
            match args.get(&param.name) {
                None => issues.push(format!("missing required parameter `{}`", param.name)),
                Some(value) if !param.param_type.matches(value) => issues.push(format!(
                    "parameter `{}` expects {}, got {}",
                    param.name,
                    param.param_type,
                    json_type_name(value)
                )),
                Some(_) => {}
            }
        }

        let known: HashSet<&str> = self
            .residual_params
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.bound_params.keys().map(String::as_str))
            .collect();
        for key in args.keys() {
            if !known.contains(key.as_str()) {
                issues.push(format!("unknown parameter `{key}`"));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::SchemaValidation {
                tool: self.name.clone(),
                issues,
            })
        }
    }

    /// Re-derives a new instance from the retained pre-classification
    /// parameter list, keeping residual schema, auth parameters and
    /// ledgers mutually consistent after every modification.
    fn recreate(
        &self,
        auth_tokens: AuthTokenRegistry,
        bound_params: BoundParamRegistry,
        strict: bool,
    ) -> Result<Self> {
        Self::new(
            self.name.clone(),
            ToolSchema {
                description: self.description.clone(),
                parameters: self.declared_params.clone(),
            },
            self.url.clone(),
            self.http.clone(),
            auth_tokens,
            bound_params,
            strict,
        )
    }
}

impl std::fmt::Debug for ToolboxTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolboxTool")
            .field("name", &self.name)
            .field("url", &self.url)
            .field(
                "parameters",
                &self
                    .residual_params
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field(
                "auth_params",
                &self
                    .auth_params
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("bound_params", &self.bound_params.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
