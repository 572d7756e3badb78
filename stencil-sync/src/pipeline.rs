//! Trigger entry points: resolve, bind, render and apply for one change.
//!
//! A pass walks (template × record × object) triples sequentially. Per-object
//! errors become failed outcomes; only listing errors abort the pass.

use tokio_util::sync::CancellationToken;

use stencil_core::types::{
    ObjectSpec, OwnerReference, ParameterRecord, Template, TemplateBinding, ValueMap,
};
use stencil_core::{EngineConfig, ParameterSource, TemplateSource};
use stencil_renderer::{RenderError, RenderedObject, Renderer, VariableMap};

use crate::apply::{self, Plan};
use crate::error::SyncError;
use crate::outcome::{OutcomeStatus, PassReport, ReconciliationOutcome, Stage};
use crate::resolver::TemplateResolver;
use crate::store::Store;

/// Rendering result for one object, tagged with its reference.
pub type RenderAttempt = (String, Result<RenderedObject, RenderError>);

/// Drives reconciliation passes against one store.
pub struct Reconciler<T, P, S> {
    resolver: TemplateResolver<T, P>,
    store: S,
    renderer: Renderer,
    config: EngineConfig,
    dry_run: bool,
}

impl<T, P, S> Reconciler<T, P, S>
where
    T: TemplateSource,
    P: ParameterSource,
    S: Store,
{
    pub fn new(templates: T, params: P, store: S, config: EngineConfig) -> Result<Self, SyncError> {
        Ok(Self {
            resolver: TemplateResolver::new(templates, params),
            store,
            renderer: Renderer::new()?,
            config,
            dry_run: false,
        })
    }

    /// Plan against the store without writing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &TemplateResolver<T, P> {
        &self.resolver
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Trigger entry points
    // -----------------------------------------------------------------------

    /// Re-render `template` for every record that references it, using each
    /// record's first binding of the template.
    pub fn on_template_changed(
        &self,
        template: &Template,
        cancel: &CancellationToken,
    ) -> Result<PassReport, SyncError> {
        let span = tracing::info_span!(
            "template_changed",
            template = %template.name,
            group_version = %self.config.group_version
        );
        let _enter = span.enter();

        let records = self.resolver.find_records_referencing(&template.name)?;
        tracing::debug!("{} record(s) reference template {}", records.len(), template.name);

        let mut report = PassReport::default();
        for record in &records {
            let Some(binding) = record.binding_for(&template.name) else {
                continue;
            };
            if !self.reconcile_pair(template, record, binding, cancel, &mut report) {
                break;
            }
        }
        Ok(report)
    }

    /// Re-render every template `record` binds, each with that binding's own
    /// values. Templates that do not exist yet are skipped.
    pub fn on_parameter_record_changed(
        &self,
        record: &ParameterRecord,
        cancel: &CancellationToken,
    ) -> Result<PassReport, SyncError> {
        let span = tracing::info_span!(
            "record_changed",
            record = %format!("{}/{}", record.namespace, record.name),
            group_version = %self.config.group_version
        );
        let _enter = span.enter();

        let mut report = PassReport::default();
        for binding in &record.bindings {
            let Some(template) = self.resolver.find_template_by_name(&binding.name)? else {
                tracing::debug!(
                    "template {} referenced by {}/{} not found, skipping",
                    binding.name,
                    record.namespace,
                    record.name
                );
                continue;
            };
            if !self.reconcile_pair(&template, record, binding, cancel, &mut report) {
                break;
            }
        }
        Ok(report)
    }

    /// [`on_template_changed`](Self::on_template_changed) for every known
    /// template, merged into one report.
    pub fn reconcile_all(&self, cancel: &CancellationToken) -> Result<PassReport, SyncError> {
        let mut report = PassReport::default();
        for template in self.resolver.all_templates()? {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.merge(self.on_template_changed(&template, cancel)?);
            if report.cancelled {
                break;
            }
        }
        Ok(report)
    }

    /// Render every object `template` defines for each referencing record,
    /// without touching the store.
    pub fn render_template(&self, template: &Template) -> Result<Vec<RenderAttempt>, SyncError> {
        let mut attempts = Vec::new();
        for record in self.resolver.find_records_referencing(&template.name)? {
            let Some(binding) = record.binding_for(&template.name) else {
                continue;
            };
            let owner = self.owner_for(&record);
            for object in &template.objects {
                let reference = object.key_in(&record.namespace).to_string();
                let rendered = self.render_object(template, object, &record, &binding.values, &owner);
                attempts.push((reference, rendered));
            }
        }
        Ok(attempts)
    }

    // -----------------------------------------------------------------------
    // Per-object work
    // -----------------------------------------------------------------------

    /// Returns `false` when the pass was cancelled.
    fn reconcile_pair(
        &self,
        template: &Template,
        record: &ParameterRecord,
        binding: &TemplateBinding,
        cancel: &CancellationToken,
        report: &mut PassReport,
    ) -> bool {
        let owner = self.owner_for(record);
        for object in &template.objects {
            if cancel.is_cancelled() {
                tracing::info!(
                    "pass cancelled after {} object(s)",
                    report.outcomes.len()
                );
                report.cancelled = true;
                return false;
            }
            let outcome = self.reconcile_object(template, object, record, &binding.values, &owner);
            report.outcomes.push(outcome);
        }
        true
    }

    fn reconcile_object(
        &self,
        template: &Template,
        object: &ObjectSpec,
        record: &ParameterRecord,
        values: &ValueMap,
        owner: &OwnerReference,
    ) -> ReconciliationOutcome {
        let rendered = match self.render_object(template, object, record, values, owner) {
            Ok(rendered) => rendered,
            Err(err) => {
                let outcome = ReconciliationOutcome::failed(
                    object.key_in(&record.namespace).to_string(),
                    Stage::from(&err),
                    err.to_string(),
                );
                tracing::warn!("{outcome}");
                return outcome;
            }
        };

        if !self.dry_run {
            return apply::apply(&self.store, &rendered);
        }
        let outcome = match apply::plan(&self.store, &rendered) {
            Ok(Plan::Create(_)) => ReconciliationOutcome::new(rendered.reference(), OutcomeStatus::WouldCreate),
            Ok(Plan::Update { .. }) => ReconciliationOutcome::new(rendered.reference(), OutcomeStatus::WouldUpdate),
            Err(err) => ReconciliationOutcome::failed(rendered.reference(), Stage::Lookup, err.to_string()),
        };
        tracing::info!("{outcome}");
        outcome
    }

    fn render_object(
        &self,
        template: &Template,
        object: &ObjectSpec,
        record: &ParameterRecord,
        values: &ValueMap,
        owner: &OwnerReference,
    ) -> Result<RenderedObject, RenderError> {
        let vars = VariableMap::bind(template, object, &record.namespace, values);
        self.renderer
            .render(object, &vars, &record.namespace, std::slice::from_ref(owner))
    }

    fn owner_for(&self, record: &ParameterRecord) -> OwnerReference {
        OwnerReference::controller_for(record, &self.config.group_version, &self.config.params_kind)
    }
}
