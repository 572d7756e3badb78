//! Variable binding: the final variable map handed to the template engine.

use std::collections::{BTreeMap, BTreeSet};

use stencil_core::types::{ObjectSpec, Template, ValueMap};

/// Reserved key: namespace the object is placed in.
pub const RESERVED_NAMESPACE: &str = "__namespace";
/// Reserved key: the object's `apiVersion`.
pub const RESERVED_API_VERSION: &str = "__apiVersion";
/// Reserved key: the object's `kind`.
pub const RESERVED_KIND: &str = "__kind";
/// Reserved key: the object's `metadata.name`.
pub const RESERVED_NAME: &str = "__name";

/// Immutable variable map for one (template, object, record) triple.
///
/// Built fresh by [`VariableMap::bind`]; the caller's values are never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMap {
    vars: BTreeMap<String, String>,
    /// Keys whose value is a template default and may hold placeholders.
    from_defaults: BTreeSet<String>,
}

impl VariableMap {
    /// Merge `template`'s declared parameters with the supplied `values` and
    /// inject the reserved keys for `object` placed in `namespace`.
    ///
    /// A declared parameter takes the supplied value when present and
    /// non-empty, otherwise its default. Supplied keys the template does not
    /// declare pass through. Reserved keys always win.
    pub fn bind(template: &Template, object: &ObjectSpec, namespace: &str, values: &ValueMap) -> Self {
        let mut vars = values.clone();
        let mut from_defaults = BTreeSet::new();

        for param in &template.parameters {
            match values.get(&param.name) {
                Some(v) if !v.is_empty() => {
                    vars.insert(param.name.clone(), v.clone());
                }
                _ => {
                    vars.insert(param.name.clone(), param.default.clone());
                    from_defaults.insert(param.name.clone());
                }
            }
        }

        for (key, value) in [
            (RESERVED_NAMESPACE, namespace),
            (RESERVED_API_VERSION, object.api_version.as_str()),
            (RESERVED_KIND, object.kind.as_str()),
            (RESERVED_NAME, object.name.as_str()),
        ] {
            vars.insert(key.to_owned(), value.to_owned());
            from_defaults.remove(key);
        }

        Self { vars, from_defaults }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// True when `key` holds a declared default rather than a supplied value.
    pub fn is_default(&self, key: &str) -> bool {
        self.from_defaults.contains(key)
    }

    /// Same map with `key` set to an already-expanded `value`.
    pub(crate) fn with_expanded(mut self, key: &str, value: String) -> Self {
        self.vars.insert(key.to_owned(), value);
        self.from_defaults.remove(key);
        self
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> tera::Context {
        let mut ctx = tera::Context::new();
        for (key, value) in &self.vars {
            ctx.insert(key.as_str(), value);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_core::types::{ObjectMetadata, Parameter, TemplateName};

    fn object() -> ObjectSpec {
        ObjectSpec {
            name: "game-config".into(),
            kind: "ConfigMap".into(),
            api_version: "v1".into(),
            metadata: ObjectMetadata::default(),
            content_key: None,
            body: "data: {}".into(),
        }
    }

    fn template(params: &[(&str, &str)]) -> Template {
        Template {
            name: TemplateName::from("t1"),
            description: String::new(),
            parameters: params
                .iter()
                .map(|(name, default)| Parameter {
                    name: (*name).into(),
                    default: (*default).into(),
                })
                .collect(),
            objects: vec![object()],
        }
    }

    fn values(pairs: &[(&str, &str)]) -> ValueMap {
        pairs.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect()
    }

    #[test]
    fn missing_value_falls_back_to_default() {
        let vars = VariableMap::bind(&template(&[("lives", "5")]), &object(), "default", &values(&[]));
        assert_eq!(vars.get("lives"), Some("5"));
        assert!(vars.is_default("lives"));
    }

    #[test]
    fn empty_value_falls_back_to_default() {
        let vars = VariableMap::bind(
            &template(&[("lives", "5")]),
            &object(),
            "default",
            &values(&[("lives", "")]),
        );
        assert_eq!(vars.get("lives"), Some("5"));
    }

    #[test]
    fn non_empty_value_overrides_default() {
        let vars = VariableMap::bind(
            &template(&[("lives", "5")]),
            &object(),
            "default",
            &values(&[("lives", "3")]),
        );
        assert_eq!(vars.get("lives"), Some("3"));
        assert!(!vars.is_default("lives"));
    }

    #[test]
    fn reserved_keys_win_over_supplied_values() {
        let supplied = values(&[
            ("__namespace", "evil"),
            ("__kind", "Secret"),
            ("__apiVersion", "v2"),
            ("__name", "other"),
        ]);
        let vars = VariableMap::bind(&template(&[]), &object(), "team-a", &supplied);
        assert_eq!(vars.get(RESERVED_NAMESPACE), Some("team-a"));
        assert_eq!(vars.get(RESERVED_KIND), Some("ConfigMap"));
        assert_eq!(vars.get(RESERVED_API_VERSION), Some("v1"));
        assert_eq!(vars.get(RESERVED_NAME), Some("game-config"));
    }

    #[test]
    fn reserved_parameter_name_is_not_treated_as_default() {
        let vars = VariableMap::bind(&template(&[("__name", "x")]), &object(), "ns", &values(&[]));
        assert_eq!(vars.get(RESERVED_NAME), Some("game-config"));
        assert!(!vars.is_default(RESERVED_NAME));
    }

    #[test]
    fn no_parameters_yields_only_reserved_keys() {
        let vars = VariableMap::bind(&template(&[]), &object(), "ns", &values(&[]));
        assert_eq!(vars.len(), 4);
    }

    #[test]
    fn undeclared_values_pass_through() {
        let vars = VariableMap::bind(
            &template(&[]),
            &object(),
            "ns",
            &values(&[("properties_file", "ui.properties")]),
        );
        assert_eq!(vars.get("properties_file"), Some("ui.properties"));
    }

    #[test]
    fn caller_values_are_not_mutated() {
        let supplied = values(&[("lives", "")]);
        let before = supplied.clone();
        let _ = VariableMap::bind(&template(&[("lives", "5")]), &object(), "ns", &supplied);
        assert_eq!(supplied, before);
    }
}
