//! Rendered objects: the desired state handed to the applier.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use stencil_core::types::{ObjectKey, OwnerReference};

use crate::error::RenderError;

/// Top-level keys the renderer owns; everything else in a rendered document
/// is content.
pub const IDENTITY_KEYS: &[&str] = &["apiVersion", "kind", "metadata"];

/// One fully rendered object.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedObject {
    pub key: ObjectKey,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub owner_references: Vec<OwnerReference>,
    /// Engine-owned top-level blocks (`spec`, `data`, ...).
    pub content: Map<String, Value>,
}

impl RenderedObject {
    /// `kind(name)@namespace`
    pub fn reference(&self) -> String {
        self.key.to_string()
    }

    /// Full manifest as a JSON value, ready for a store create.
    pub fn to_value(&self) -> Value {
        let mut metadata = Map::new();
        metadata.insert("name".into(), json!(self.key.name));
        metadata.insert("namespace".into(), json!(self.key.namespace));
        if !self.labels.is_empty() {
            metadata.insert("labels".into(), json!(self.labels));
        }
        if !self.annotations.is_empty() {
            metadata.insert("annotations".into(), json!(self.annotations));
        }
        if !self.owner_references.is_empty() {
            metadata.insert("ownerReferences".into(), json!(self.owner_references));
        }

        let mut root = Map::new();
        root.insert("apiVersion".into(), json!(self.key.api_version));
        root.insert("kind".into(), json!(self.key.kind));
        root.insert("metadata".into(), Value::Object(metadata));
        for (key, value) in &self.content {
            root.insert(key.clone(), value.clone());
        }
        Value::Object(root)
    }

    /// Manifest as a YAML document.
    pub fn to_yaml(&self) -> Result<String, RenderError> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }
}
