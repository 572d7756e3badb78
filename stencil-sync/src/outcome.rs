//! Per-object reconciliation outcomes and their aggregation.

use std::fmt;

use stencil_renderer::RenderError;

/// Status string reported when every object in a pass succeeded.
pub const STATUS_OK: &str = "OK";

/// Pipeline step an object failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Render,
    Decode,
    Lookup,
    Create,
    Update,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Render => "render",
            Stage::Decode => "decode",
            Stage::Lookup => "lookup",
            Stage::Create => "create",
            Stage::Update => "update",
        };
        f.write_str(s)
    }
}

impl From<&RenderError> for Stage {
    fn from(err: &RenderError) -> Self {
        match err {
            RenderError::Decode(_) => Stage::Decode,
            _ => Stage::Render,
        }
    }
}

/// What happened to one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Created,
    Updated,
    /// Dry run: the object would have been created.
    WouldCreate,
    /// Dry run: the object would have been updated.
    WouldUpdate,
    Failed { stage: Stage, message: String },
}

/// Result of reconciling one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    /// `kind(name)@namespace`
    pub reference: String,
    pub status: OutcomeStatus,
}

impl ReconciliationOutcome {
    pub fn new(reference: impl Into<String>, status: OutcomeStatus) -> Self {
        Self { reference: reference.into(), status }
    }

    pub fn failed(reference: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self::new(
            reference,
            OutcomeStatus::Failed { stage, message: message.into() },
        )
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Failed { .. })
    }

    /// `<reference>: <stage> failed: <cause>` for failures, `None` otherwise.
    pub fn error_message(&self) -> Option<String> {
        match &self.status {
            OutcomeStatus::Failed { stage, message } => {
                Some(format!("{}: {stage} failed: {message}", self.reference))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            OutcomeStatus::Created => write!(f, "created {}", self.reference),
            OutcomeStatus::Updated => write!(f, "updated {}", self.reference),
            OutcomeStatus::WouldCreate => write!(f, "[dry-run] would create {}", self.reference),
            OutcomeStatus::WouldUpdate => write!(f, "[dry-run] would update {}", self.reference),
            OutcomeStatus::Failed { stage, message } => {
                write!(f, "failed {} ({stage}): {message}", self.reference)
            }
        }
    }
}

/// `"OK"` when every outcome succeeded, else every failure message joined by
/// `\n` in input order. Successes are omitted.
pub fn aggregate(outcomes: &[ReconciliationOutcome]) -> String {
    let failures: Vec<String> = outcomes
        .iter()
        .filter_map(ReconciliationOutcome::error_message)
        .collect();
    if failures.is_empty() {
        STATUS_OK.to_owned()
    } else {
        failures.join("\n")
    }
}

/// Everything one reconciliation pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub outcomes: Vec<ReconciliationOutcome>,
    /// The pass stopped early; `outcomes` holds what finished before that.
    pub cancelled: bool,
}

impl PassReport {
    pub fn status(&self) -> String {
        aggregate(&self.outcomes)
    }

    pub fn is_ok(&self) -> bool {
        self.outcomes.iter().all(ReconciliationOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReconciliationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Append `other`, keeping the cancelled flag sticky.
    pub fn merge(&mut self, other: PassReport) {
        self.outcomes.extend(other.outcomes);
        self.cancelled |= other.cancelled;
    }
}
