//! stencil core library: domain types, configuration, and template/parameter sources.
//!
//! - [`types`]: templates, parameter records, object identity
//! - [`source`]: [`TemplateSource`] / [`ParameterSource`] and the on-disk [`Catalog`]
//! - [`config`]: [`EngineConfig`]
//! - [`error`]: [`SourceError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use config::EngineConfig;
pub use error::{ConfigError, SourceError};
pub use source::{Catalog, ParameterSource, TemplateSource};
pub use types::{
    ObjectKey, ObjectMetadata, ObjectSpec, OwnerReference, Parameter, ParameterRecord, Template,
    TemplateBinding, TemplateName, ValueMap,
};
