//! Pure partitioning of a tool's declared parameters.
//!
//! The builder decomposes a parameter list into three disjoint sets:
//! parameters the service fills from an identity token, parameters bound
//! by the integrator, and the residual set the caller supplies directly.

use crate::types::ParameterSchema;
use std::collections::HashSet;

/// Splits parameters into auth-required and plain ones.
///
/// A parameter is auth-required when it declares at least one auth
/// source. Input order is preserved within both partitions.
pub fn split_auth_params(
    params: &[ParameterSchema],
) -> (Vec<ParameterSchema>, Vec<ParameterSchema>) {
    params.iter().cloned().partition(|param| param.requires_auth())
}

/// Splits plain parameters into those named in `bound_names` and the
/// free remainder.
///
/// Names in `bound_names` without a matching parameter are not an error
/// here; the builder diagnoses them against the full parameter list.
pub fn split_bound_params(
    params: &[ParameterSchema],
    bound_names: &HashSet<String>,
) -> (Vec<ParameterSchema>, Vec<ParameterSchema>) {
    params
        .iter()
        .cloned()
        .partition(|param| bound_names.contains(&param.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamType;

    fn param(name: &str, auth_sources: Option<Vec<&str>>) -> ParameterSchema {
        ParameterSchema {
            name: name.to_string(),
            param_type: ParamType::String,
            description: String::new(),
            auth_sources: auth_sources
                .map(|sources| sources.into_iter().map(str::to_string).collect()),
        }
    }

    #[test]
    fn auth_split_preserves_order_and_recovers_input() {
        let params = vec![
            param("a", None),
            param("b", Some(vec!["google"])),
            param("c", None),
            param("d", Some(vec!["github", "google"])),
            param("e", Some(vec![])),
        ];

        let (auth, plain) = split_auth_params(&params);
        let auth_names: Vec<_> = auth.iter().map(|p| p.name.as_str()).collect();
        let plain_names: Vec<_> = plain.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(auth_names, ["b", "d"]);
        // An empty authSources list means no auth requirement.
        assert_eq!(plain_names, ["a", "c", "e"]);
        assert_eq!(auth.len() + plain.len(), params.len());
    }

    #[test]
    fn bound_split_partitions_by_name() {
        let params = vec![param("a", None), param("b", None), param("c", None)];
        let bound_names: HashSet<String> = ["b".to_string(), "nonexistent".to_string()].into();

        let (bound, free) = split_bound_params(&params, &bound_names);
        let bound_names: Vec<_> = bound.iter().map(|p| p.name.as_str()).collect();
        let free_names: Vec<_> = free.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(bound_names, ["b"]);
        assert_eq!(free_names, ["a", "c"]);
    }

    #[test]
    fn full_classification_is_a_partition() {
        let params = vec![
            param("q", None),
            param("limit", None),
            param("user_id", Some(vec!["google"])),
            param("page", None),
        ];
        let bound_names: HashSet<String> = ["limit".to_string()].into();

        let (auth, plain) = split_auth_params(&params);
        let (bound, free) = split_bound_params(&plain, &bound_names);

        let mut recovered: Vec<_> = auth
            .iter()
            .chain(bound.iter())
            .chain(free.iter())
            .map(|p| p.name.clone())
            .collect();
        recovered.sort();

        let mut original: Vec<_> = params.iter().map(|p| p.name.clone()).collect();
        original.sort();

        assert_eq!(recovered, original);
    }
}
