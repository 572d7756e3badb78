//! `stencil diff`: show unified diffs for what apply would write.

use anyhow::{bail, Context, Result};
use clap::Args;

use stencil_core::TemplateSource;
use stencil_sync::{diff_template, DiffReport};

use super::{GlobalArgs, Workspace};

/// Arguments for `stencil diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Template to diff; every template when omitted.
    #[arg(long)]
    pub template: Option<String>,
}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let workspace = Workspace::open(global)?;
        let reconciler = workspace.reconciler()?;

        let templates = match &self.template {
            Some(name) => vec![workspace.template(name)?],
            None => workspace
                .catalog
                .list_templates()
                .context("failed to list templates")?,
        };

        let mut combined = DiffReport::default();
        for template in &templates {
            let report = diff_template(&reconciler, template)
                .with_context(|| format!("diff failed for template '{}'", template.name))?;
            combined.diffs.extend(report.diffs);
            combined.failures.extend(report.failures);
        }

        if combined.diffs.is_empty() {
            println!("No differences.");
        }
        for diff in &combined.diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        for failure in &combined.failures {
            eprintln!("{failure}");
        }
        if !combined.failures.is_empty() {
            bail!("{} object(s) could not be diffed", combined.failures.len());
        }
        Ok(())
    }
}
