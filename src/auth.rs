//! Auth completeness checking and token resolution for tools with
//! identity-backed parameters.

use crate::types::{AuthTokenRegistry, ParameterSchema};
use std::collections::HashMap;

/// Returns the names of auth-required parameters with no registered
/// source.
///
/// A parameter is satisfied when any one of its permitted sources has a
/// token getter registered; the order of its sources carries no
/// priority.
pub fn missing_auth_params(
    auth_params: &[ParameterSchema],
    tokens: &AuthTokenRegistry,
) -> Vec<String> {
    auth_params
        .iter()
        .filter(|param| {
            !param
                .auth_sources
                .as_deref()
                .unwrap_or_default()
                .iter()
                .any(|source| tokens.contains_key(source))
        })
        .map(|param| param.name.clone())
        .collect()
}

/// Resolves every registered getter into the header map sent with an
/// invocation. Header names are derived from the source name as
/// `<source>_token`; the token itself never appears as a call argument.
pub fn resolve_token_headers(tokens: &AuthTokenRegistry) -> HashMap<String, String> {
    tokens
        .iter()
        .map(|(source, get_token)| (format!("{source}_token"), get_token()))
        .collect()
}
