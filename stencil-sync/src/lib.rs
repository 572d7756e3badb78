//! # stencil-sync
//!
//! Reconciliation: resolve templates and parameter records, render every
//! affected object and create or update it in a [`Store`].
//!
//! Call [`Reconciler::on_template_changed`] or
//! [`Reconciler::on_parameter_record_changed`] for a single change, or
//! [`Reconciler::reconcile_all`] to process every known template.

pub mod apply;
pub mod diff;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod resolver;
pub mod store;

pub use apply::{apply, merge, Plan};
pub use diff::{diff_template, DiffReport, ObjectDiff};
pub use error::{StoreError, SyncError};
pub use outcome::{aggregate, OutcomeStatus, PassReport, ReconciliationOutcome, Stage};
pub use pipeline::Reconciler;
pub use resolver::TemplateResolver;
pub use store::{FileStore, InMemoryStore, Store};
