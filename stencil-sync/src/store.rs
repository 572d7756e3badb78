//! Target object stores.
//!
//! A store holds full manifests as [`serde_json::Value`] keyed by
//! [`ObjectKey`]. Every store versions its objects through
//! `metadata.resourceVersion` and rejects updates carrying a stale version.
//!
//! # File layout
//!
//! ```text
//! <root>/<namespace>/<kind>.<apiVersion>/<name>.yaml
//! ```
//!
//! A `/` in the apiVersion is written as `_`, so `apps/v1` Deployments live
//! under `Deployment.apps_v1/`. Identity fields that are not plain path
//! components (`..`, separators) are rejected as [`StoreError::Invalid`].
//! Writes use the atomic `.tmp` + rename pattern.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use stencil_core::types::ObjectKey;

use crate::error::{io_err, StoreError};

// ---------------------------------------------------------------------------
// 1. Store trait
// ---------------------------------------------------------------------------

/// Get/create/update access to target objects.
///
/// Methods take `&self`; implementations handle their own locking.
pub trait Store {
    /// Fetch the stored object. [`StoreError::NotFound`] when absent.
    fn get(&self, key: &ObjectKey) -> Result<Value, StoreError>;
    /// Store a new object.
    fn create(&self, object: &Value) -> Result<(), StoreError>;
    /// Replace an existing object.
    fn update(&self, object: &Value) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for &S {
    fn get(&self, key: &ObjectKey) -> Result<Value, StoreError> {
        (**self).get(key)
    }
    fn create(&self, object: &Value) -> Result<(), StoreError> {
        (**self).create(object)
    }
    fn update(&self, object: &Value) -> Result<(), StoreError> {
        (**self).update(object)
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn get(&self, key: &ObjectKey) -> Result<Value, StoreError> {
        (**self).get(key)
    }
    fn create(&self, object: &Value) -> Result<(), StoreError> {
        (**self).create(object)
    }
    fn update(&self, object: &Value) -> Result<(), StoreError> {
        (**self).update(object)
    }
}

// ---------------------------------------------------------------------------
// 2. Manifest helpers
// ---------------------------------------------------------------------------

/// Identity of a manifest, read from `apiVersion`, `kind` and `metadata`.
pub fn object_key(object: &Value) -> Result<ObjectKey, StoreError> {
    let field = |value: Option<&Value>, name: &str| {
        value
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| StoreError::Invalid(format!("missing {name}")))
    };
    let metadata = object.get("metadata");
    Ok(ObjectKey {
        api_version: field(object.get("apiVersion"), "apiVersion")?,
        kind: field(object.get("kind"), "kind")?,
        namespace: field(metadata.and_then(|m| m.get("namespace")), "metadata.namespace")?,
        name: field(metadata.and_then(|m| m.get("name")), "metadata.name")?,
    })
}

/// `metadata.resourceVersion`, if set.
pub fn resource_version(object: &Value) -> Option<&str> {
    object.get("metadata")?.get("resourceVersion")?.as_str()
}

fn metadata_mut(object: &mut Value) -> Result<&mut Map<String, Value>, StoreError> {
    object
        .get_mut("metadata")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StoreError::Invalid("metadata is not a mapping".into()))
}

/// Stored form of a newly created object.
fn stamp_created(object: &Value, version: u64) -> Result<Value, StoreError> {
    let mut stored = object.clone();
    let metadata = metadata_mut(&mut stored)?;
    metadata.insert("resourceVersion".into(), Value::String(version.to_string()));
    metadata.insert(
        "creationTimestamp".into(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    Ok(stored)
}

/// Stored form of an update of `stored` to `incoming`.
///
/// An `incoming` without a resourceVersion is applied unconditionally.
fn stamp_updated(
    key: &ObjectKey,
    stored: &Value,
    incoming: &Value,
    version: u64,
) -> Result<Value, StoreError> {
    let current = resource_version(stored).unwrap_or_default();
    if let Some(given) = resource_version(incoming) {
        if given != current {
            return Err(StoreError::Conflict {
                reference: key.to_string(),
                stored: current.to_owned(),
                given: given.to_owned(),
            });
        }
    }

    let created_at = stored
        .get("metadata")
        .and_then(|m| m.get("creationTimestamp"))
        .cloned();
    let mut next = incoming.clone();
    let metadata = metadata_mut(&mut next)?;
    metadata.insert("resourceVersion".into(), Value::String(version.to_string()));
    if let Some(ts) = created_at {
        metadata.insert("creationTimestamp".into(), ts);
    }
    Ok(next)
}

// ---------------------------------------------------------------------------
// 3. In-memory store
// ---------------------------------------------------------------------------

/// Mutex-guarded map store. Versions come from one store-wide counter.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<ObjectKey, Value>,
    last_version: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored object, ordered by key.
    pub fn objects(&self) -> Vec<Value> {
        self.lock().objects.values().cloned().collect()
    }
}

impl Store for InMemoryStore {
    fn get(&self, key: &ObjectKey) -> Result<Value, StoreError> {
        self.lock()
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn create(&self, object: &Value) -> Result<(), StoreError> {
        let key = object_key(object)?;
        let mut state = self.lock();
        if state.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        let stored = stamp_created(object, state.last_version + 1)?;
        state.last_version += 1;
        state.objects.insert(key, stored);
        Ok(())
    }

    fn update(&self, object: &Value) -> Result<(), StoreError> {
        let key = object_key(object)?;
        let mut state = self.lock();
        let Some(stored) = state.objects.get(&key) else {
            return Err(StoreError::NotFound(key.to_string()));
        };
        let next = stamp_updated(&key, stored, object, state.last_version + 1)?;
        state.last_version += 1;
        state.objects.insert(key, next);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 4. File store
// ---------------------------------------------------------------------------

/// One YAML document per object under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

/// `<root>/<namespace>/<kind>.<apiVersion>/<name>.yaml`
pub fn object_path_at(root: &Path, key: &ObjectKey) -> Result<PathBuf, StoreError> {
    for segment in key.api_version.split('/') {
        path_component("apiVersion", segment)?;
    }
    let kind_dir = format!(
        "{}.{}",
        path_component("kind", &key.kind)?,
        key.api_version.replace('/', "_")
    );
    Ok(root
        .join(path_component("namespace", &key.namespace)?)
        .join(kind_dir)
        .join(format!("{}.yaml", path_component("name", &key.name)?)))
}

/// `value` if it names exactly one directory entry.
fn path_component<'a>(field: &str, value: &'a str) -> Result<&'a str, StoreError> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(StoreError::Invalid(format!(
            "{field} '{value}' cannot be used as a path component"
        )));
    }
    Ok(value)
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &ObjectKey) -> Result<PathBuf, StoreError> {
        object_path_at(&self.root, key)
    }

    fn read(&self, key: &ObjectKey) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(path, err)),
        };
        serde_yaml::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Serialization { path, source })
    }

    /// Write to `<path>.tmp` then rename to `<path>`.
    fn write(&self, key: &ObjectKey, object: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let yaml = serde_yaml::to_string(object).map_err(|source| StoreError::Serialization {
            path: path.clone(),
            source,
        })?;
        let tmp = path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(path, e));
        }
        Ok(())
    }
}

impl Store for FileStore {
    fn get(&self, key: &ObjectKey) -> Result<Value, StoreError> {
        self.read(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn create(&self, object: &Value) -> Result<(), StoreError> {
        let key = object_key(object)?;
        if self.read(&key)?.is_some() {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        self.write(&key, &stamp_created(object, 1)?)
    }

    fn update(&self, object: &Value) -> Result<(), StoreError> {
        let key = object_key(object)?;
        let Some(stored) = self.read(&key)? else {
            return Err(StoreError::NotFound(key.to_string()));
        };
        let version = resource_version(&stored)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        self.write(&key, &stamp_updated(&key, &stored, object, version)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
