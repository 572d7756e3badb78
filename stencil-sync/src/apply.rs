//! Reconciliation applier: create-if-absent, otherwise overlay and update.
//!
//! On update the engine owns only the content blocks, `metadata.labels` and
//! `metadata.annotations`. Every other field of the stored object (status,
//! resourceVersion, ownerReferences, ...) is carried over unchanged.

use serde_json::{json, Map, Value};

use stencil_renderer::RenderedObject;

use crate::error::StoreError;
use crate::outcome::{OutcomeStatus, ReconciliationOutcome, Stage};
use crate::store::Store;

/// What the applier will write for one rendered object.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Create(Value),
    Update { existing: Value, desired: Value },
}

impl Plan {
    /// The manifest that would be written.
    pub fn desired(&self) -> &Value {
        match self {
            Plan::Create(desired) | Plan::Update { desired, .. } => desired,
        }
    }
}

/// Look `rendered` up in `store` and decide between create and update.
///
/// Only lookup errors other than not-found surface as `Err`.
pub fn plan<S: Store + ?Sized>(store: &S, rendered: &RenderedObject) -> Result<Plan, StoreError> {
    match store.get(&rendered.key) {
        Ok(existing) => {
            let desired = merge(&existing, rendered);
            Ok(Plan::Update { existing, desired })
        }
        Err(err) if err.is_not_found() => Ok(Plan::Create(rendered.to_value())),
        Err(err) => Err(err),
    }
}

/// Create or update `rendered` in `store`. Never panics or short-circuits a
/// batch; every failure becomes a failed outcome.
pub fn apply<S: Store + ?Sized>(store: &S, rendered: &RenderedObject) -> ReconciliationOutcome {
    let reference = rendered.reference();
    let outcome = match plan(store, rendered) {
        Err(err) => ReconciliationOutcome::failed(reference, Stage::Lookup, err.to_string()),
        Ok(Plan::Create(desired)) => match store.create(&desired) {
            Ok(()) => ReconciliationOutcome::new(reference, OutcomeStatus::Created),
            Err(err) => ReconciliationOutcome::failed(reference, Stage::Create, err.to_string()),
        },
        Ok(Plan::Update { desired, .. }) => match store.update(&desired) {
            Ok(()) => ReconciliationOutcome::new(reference, OutcomeStatus::Updated),
            Err(err) => ReconciliationOutcome::failed(reference, Stage::Update, err.to_string()),
        },
    };

    if outcome.is_success() {
        tracing::info!("{outcome}");
    } else {
        tracing::warn!("{outcome}");
    }
    outcome
}

/// `existing` with the engine-owned fields of `rendered` laid over it.
///
/// Content blocks replace same-named top-level keys. Labels and annotations
/// are replaced wholesale and removed when the template declares none.
pub fn merge(existing: &Value, rendered: &RenderedObject) -> Value {
    let Value::Object(mut root) = existing.clone() else {
        return rendered.to_value();
    };

    for (key, value) in &rendered.content {
        root.insert(key.clone(), value.clone());
    }

    let metadata = root
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if !metadata.is_object() {
        *metadata = Value::Object(Map::new());
    }
    if let Value::Object(metadata) = metadata {
        set_or_remove(metadata, "labels", json!(rendered.labels), rendered.labels.is_empty());
        set_or_remove(
            metadata,
            "annotations",
            json!(rendered.annotations),
            rendered.annotations.is_empty(),
        );
    }

    Value::Object(root)
}

fn set_or_remove(metadata: &mut Map<String, Value>, key: &str, value: Value, empty: bool) {
    if empty {
        metadata.remove(key);
    } else {
        metadata.insert(key.to_owned(), value);
    }
}
