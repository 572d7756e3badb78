//! Dry-run unified diff support for `stencil diff`.

use similar::TextDiff;

use stencil_core::types::Template;
use stencil_core::{ParameterSource, TemplateSource};

use crate::apply::{self, Plan};
use crate::outcome::{ReconciliationOutcome, Stage};
use crate::pipeline::Reconciler;
use crate::store::Store;
use crate::SyncError;

/// Diff between one stored object and what the applier would write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDiff {
    /// `kind(name)@namespace`
    pub reference: String,
    pub unified_diff: String,
}

/// Diff result for one template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub diffs: Vec<ObjectDiff>,
    /// Objects that could not be rendered or looked up.
    pub failures: Vec<ReconciliationOutcome>,
}

/// Render `template` for every referencing record and compare each object to
/// its stored form. Objects that would not change are omitted.
///
/// No objects are written.
pub fn diff_template<T, P, S>(
    reconciler: &Reconciler<T, P, S>,
    template: &Template,
) -> Result<DiffReport, SyncError>
where
    T: TemplateSource,
    P: ParameterSource,
    S: Store,
{
    let mut report = DiffReport::default();
    for (reference, attempt) in reconciler.render_template(template)? {
        let rendered = match attempt {
            Ok(rendered) => rendered,
            Err(err) => {
                report
                    .failures
                    .push(ReconciliationOutcome::failed(reference, Stage::from(&err), err.to_string()));
                continue;
            }
        };

        let (existing, desired) = match apply::plan(reconciler.store(), &rendered) {
            Ok(Plan::Create(desired)) => (String::new(), to_yaml(&desired)),
            Ok(Plan::Update { existing, desired }) => (to_yaml(&existing), to_yaml(&desired)),
            Err(err) => {
                report
                    .failures
                    .push(ReconciliationOutcome::failed(reference, Stage::Lookup, err.to_string()));
                continue;
            }
        };
        if existing == desired {
            continue;
        }

        let unified = TextDiff::from_lines(&existing, &desired)
            .unified_diff()
            .header(&format!("a/{reference}"), &format!("b/{reference}"))
            .context_radius(3)
            .to_string();
        report.diffs.push(ObjectDiff {
            reference,
            unified_diff: unified,
        });
    }
    Ok(report)
}

fn to_yaml(value: &serde_json::Value) -> String {
    serde_yaml::to_string(value).unwrap_or_else(|_| value.to_string())
}
