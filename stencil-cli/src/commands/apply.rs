//! `stencil apply`: reconcile objects into the file store.

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use stencil_core::ParameterSource;
use stencil_sync::PassReport;

use super::{GlobalArgs, Workspace};

/// Arguments for `stencil apply`. With neither `--template` nor `--params`
/// every template is reconciled.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Reconcile everything that uses this template.
    #[arg(long, conflicts_with = "params")]
    pub template: Option<String>,

    /// Reconcile everything this parameter record binds, as `<namespace>/<name>`.
    #[arg(long, value_name = "NAMESPACE/NAME")]
    pub params: Option<String>,

    /// Show what would be created or updated without writing.
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let workspace = Workspace::open(global)?;
        let reconciler = workspace.reconciler()?.with_dry_run(self.dry_run);
        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(cancel.clone());

        let report = if let Some(name) = &self.template {
            let template = workspace.template(name)?;
            reconciler
                .on_template_changed(&template, &cancel)
                .with_context(|| format!("apply failed for template '{name}'"))?
        } else if let Some(id) = &self.params {
            let (namespace, name) = id
                .split_once('/')
                .with_context(|| format!("expected <namespace>/<name>, got '{id}'"))?;
            let record = workspace
                .catalog
                .list_records()
                .context("failed to list parameter records")?
                .into_iter()
                .find(|r| r.namespace == namespace && r.name == name)
                .with_context(|| format!("parameter record '{id}' not found"))?;
            reconciler
                .on_parameter_record_changed(&record, &cancel)
                .with_context(|| format!("apply failed for parameter record '{id}'"))?
        } else {
            reconciler.reconcile_all(&cancel).context("apply failed")?
        };

        print_report(&report);
        check_report(&report)
    }
}

/// Error when any object failed or the pass was interrupted.
fn check_report(report: &PassReport) -> Result<()> {
    if !report.is_ok() {
        bail!("{} object(s) failed", report.failures().count());
    }
    if report.cancelled {
        bail!("apply cancelled after {} object(s)", report.outcomes.len());
    }
    Ok(())
}

/// Cancel `cancel` on Ctrl-C so the pass stops before its next object.
///
/// The listener runs on its own thread with a single-threaded runtime and
/// ends with the process.
fn cancel_on_ctrl_c(cancel: CancellationToken) {
    let spawned = std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::warn!("ctrl-c handler unavailable: {err}");
                    return;
                }
            };
            runtime.block_on(async {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    signal = tokio::signal::ctrl_c() => match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, stopping after the current object");
                            cancel.cancel();
                        }
                        Err(err) => tracing::warn!("ctrl-c handler failed: {err}"),
                    },
                }
            });
        });
    if let Err(err) = spawned {
        tracing::warn!("failed to start ctrl-c listener: {err}");
    }
}

fn print_report(report: &PassReport) {
    if report.outcomes.is_empty() {
        println!("Nothing to apply.");
    }
    for outcome in &report.outcomes {
        println!("{outcome}");
    }
    if report.cancelled {
        println!("(cancelled before completion)");
    }
    println!("status: {}", report.status());
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_sync::{OutcomeStatus, ReconciliationOutcome, Stage};

    fn created(name: &str) -> ReconciliationOutcome {
        ReconciliationOutcome::new(format!("ConfigMap({name})@default"), OutcomeStatus::Created)
    }

    #[test]
    fn complete_pass_is_ok() {
        let report = PassReport { outcomes: vec![created("a")], cancelled: false };
        assert!(check_report(&report).is_ok());
    }

    #[test]
    fn cancelled_pass_is_an_error() {
        let report = PassReport { outcomes: vec![created("a")], cancelled: true };
        let err = check_report(&report).unwrap_err();
        assert_eq!(err.to_string(), "apply cancelled after 1 object(s)");
    }

    #[test]
    fn failures_take_precedence_over_cancellation() {
        let failed = ReconciliationOutcome::failed("ConfigMap(b)@default", Stage::Create, "boom");
        let report = PassReport { outcomes: vec![created("a"), failed], cancelled: true };
        let err = check_report(&report).unwrap_err();
        assert_eq!(err.to_string(), "1 object(s) failed");
    }
}
