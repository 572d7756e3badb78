//! Template resolver: name lookups across the template and parameter sources.
//!
//! Every call re-lists its source; nothing is cached between calls.

use stencil_core::types::{ParameterRecord, Template, TemplateName};
use stencil_core::{ParameterSource, SourceError, TemplateSource};

pub struct TemplateResolver<T, P> {
    templates: T,
    params: P,
}

impl<T: TemplateSource, P: ParameterSource> TemplateResolver<T, P> {
    pub fn new(templates: T, params: P) -> Self {
        Self { templates, params }
    }

    /// First template named `name`. `Ok(None)` is "not found", not an error.
    pub fn find_template_by_name(&self, name: &TemplateName) -> Result<Option<Template>, SourceError> {
        Ok(self
            .templates
            .list_templates()?
            .into_iter()
            .find(|t| &t.name == name))
    }

    /// Every record with a binding for `name`, in source order.
    pub fn find_records_referencing(&self, name: &TemplateName) -> Result<Vec<ParameterRecord>, SourceError> {
        Ok(self
            .params
            .list_records()?
            .into_iter()
            .filter(|r| r.references(name))
            .collect())
    }

    pub fn all_templates(&self) -> Result<Vec<Template>, SourceError> {
        self.templates.list_templates()
    }
}
