//! Domain types for templates, parameter records, and object identity.
//!
//! All types are serializable/deserializable via serde + serde_yaml, using the
//! camelCase field names of the on-disk catalog.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed template name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateName(pub String);

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TemplateName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TemplateName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Supplied parameter values: parameter name → string value.
pub type ValueMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// A declared template input with its fallback value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// May itself contain placeholders such as `{{ .__namespace }}`.
    #[serde(default)]
    pub default: String,
}

/// Labels and annotations stamped on a rendered object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// One object a template instantiates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSpec {
    pub name: String,
    pub kind: String,
    pub api_version: String,
    #[serde(default)]
    pub metadata: ObjectMetadata,
    /// Key the body is nested under (`spec`, `data`, ...). When absent the body
    /// is expected to carry its own top-level key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_key: Option<String>,
    #[serde(alias = "templateBody")]
    pub body: String,
}

impl ObjectSpec {
    /// Identity of this object once placed in `namespace`.
    pub fn key_in(&self, namespace: &str) -> ObjectKey {
        ObjectKey {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            namespace: namespace.to_owned(),
            name: self.name.clone(),
        }
    }
}

/// A named definition of one or more objects to instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: TemplateName,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
}

// ---------------------------------------------------------------------------
// Parameter records
// ---------------------------------------------------------------------------

/// Values bound to a single template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBinding {
    /// Name of the referenced template.
    pub name: TemplateName,
    #[serde(default)]
    pub values: ValueMap,
}

/// Concrete values for one or more templates, scoped to a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    /// Target scope: rendered objects are placed here.
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, rename = "templates")]
    pub bindings: Vec<TemplateBinding>,
}

impl ParameterRecord {
    /// First binding for `template`, if this record references it.
    pub fn binding_for(&self, template: &TemplateName) -> Option<&TemplateBinding> {
        self.bindings.iter().find(|b| &b.name == template)
    }

    pub fn references(&self, template: &TemplateName) -> bool {
        self.binding_for(template).is_some()
    }
}

// ---------------------------------------------------------------------------
// Object identity
// ---------------------------------------------------------------------------

/// Store identity of a target object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectKey {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

/// Human-readable `kind(name)@namespace`.
impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})@{}", self.kind, self.name, self.namespace)
    }
}

/// Reference from a rendered object back to the record that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_owner_deletion: Option<bool>,
}

impl OwnerReference {
    /// Controller reference to `record`, typed with the configured group version.
    pub fn controller_for(record: &ParameterRecord, api_version: &str, kind: &str) -> Self {
        Self {
            api_version: api_version.to_owned(),
            kind: kind.to_owned(),
            name: record.name.clone(),
            uid: record.uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
