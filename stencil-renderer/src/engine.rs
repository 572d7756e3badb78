//! Object renderer: turns an [`ObjectSpec`] plus a [`VariableMap`] into a
//! [`RenderedObject`].
//!
//! Template bodies use `{{ .name }}` placeholders. Before handing text to
//! tera the leading dot is stripped, so `{{ .lives }}` renders as `{{ lives }}`.
//! Only `{{ }}` is live: tera's `{%` and `{#` openers outside placeholders are
//! emitted as literal text. Tera rejects undefined variables, which surfaces
//! as [`RenderError::Template`].

use regex::Regex;
use serde_json::Value;
use tera::Tera;

use stencil_core::types::{ObjectSpec, OwnerReference};

use crate::context::VariableMap;
use crate::error::{error_chain, RenderError};
use crate::object::{RenderedObject, IDENTITY_KEYS};

const PLACEHOLDER_PATTERN: &str = r"(?P<open>\{\{-?\s*)\.(?P<first>[A-Za-z_])";
const EXPRESSION_PATTERN: &str = r"(?s)\{\{.*?\}\}";

// ---------------------------------------------------------------------------
// Document assembly
// ---------------------------------------------------------------------------

/// Indent every continuation line of `body` by two spaces.
pub fn indent(body: &str) -> String {
    body.replace('\n', "\n  ")
}

/// Provisional document for `spec`, before substitution.
///
/// With a `contentKey` the body is nested under that key; otherwise the body
/// is appended as-is and must carry its own top-level key.
pub fn document(spec: &ObjectSpec) -> String {
    let mut doc = format!("---\napiVersion: {}\nkind: {}\n", spec.api_version, spec.kind);
    match &spec.content_key {
        Some(key) => {
            doc.push_str(key);
            doc.push_str(":\n  ");
            doc.push_str(&indent(&spec.body));
        }
        None => doc.push_str(&spec.body),
    }
    doc
}

/// `text` with tera's statement and comment openers turned into string
/// expressions that print them.
fn literal_openers(text: &str) -> String {
    text.replace("{%", r#"{{ "{%" }}"#)
        .replace("{#", r#"{{ "{#" }}"#)
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Stateless renderer. Create once with [`Renderer::new`] and reuse.
#[derive(Debug, Clone)]
pub struct Renderer {
    placeholder: Regex,
    expression: Regex,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer {
            placeholder: Regex::new(PLACEHOLDER_PATTERN)?,
            expression: Regex::new(EXPRESSION_PATTERN)?,
        })
    }

    /// Rewrite `{{ .name }}` placeholders into tera syntax and quote every
    /// other tera opener.
    pub fn translate(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for expr in self.expression.find_iter(text) {
            out.push_str(&literal_openers(&text[last..expr.start()]));
            out.push_str(&self.placeholder.replace_all(expr.as_str(), "${open}${first}"));
            last = expr.end();
        }
        out.push_str(&literal_openers(&text[last..]));
        out
    }

    /// Substitute `vars` into `text`.
    pub fn substitute(&self, text: &str, vars: &VariableMap) -> Result<String, RenderError> {
        let ctx = vars.to_tera_context();
        Ok(Tera::one_off(&self.translate(text), &ctx, false)?)
    }

    /// Expand declared defaults that themselves hold placeholders, once,
    /// against the same map.
    pub fn expand_defaults(&self, vars: &VariableMap) -> Result<VariableMap, RenderError> {
        let pending: Vec<(String, String)> = vars
            .iter()
            .filter(|(key, value)| vars.is_default(key) && value.contains("{{"))
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();

        let mut expanded = vars.clone();
        for (key, value) in pending {
            let rendered = self.substitute(&value, vars)?;
            expanded = expanded.with_expanded(&key, rendered);
        }
        Ok(expanded)
    }

    /// Render one object into `namespace`, stamped with `owners`.
    pub fn render(
        &self,
        spec: &ObjectSpec,
        vars: &VariableMap,
        namespace: &str,
        owners: &[OwnerReference],
    ) -> Result<RenderedObject, RenderError> {
        let vars = self.expand_defaults(vars)?;
        let text = self.substitute(&document(spec), &vars)?;

        let decoded: Value =
            serde_yaml::from_str(&text).map_err(|e| RenderError::Decode(error_chain(&e)))?;
        let Value::Object(mut content) = decoded else {
            return Err(RenderError::Decode(format!(
                "rendered {} '{}' is not a mapping",
                spec.kind, spec.name
            )));
        };
        for key in IDENTITY_KEYS {
            content.remove(*key);
        }

        Ok(RenderedObject {
            key: spec.key_in(namespace),
            labels: spec.metadata.labels.clone(),
            annotations: spec.metadata.annotations.clone(),
            owner_references: owners.to_vec(),
            content,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
