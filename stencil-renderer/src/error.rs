//! Error types for stencil-renderer.

use thiserror::Error;

/// All errors that can arise while rendering one object.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Malformed template syntax or a reference to an undefined variable.
    /// Carries the substitution engine's full error chain.
    #[error("template error: {0}")]
    Template(String),

    /// The substituted text is not a valid YAML mapping.
    #[error("decode error: {0}")]
    Decode(String),

    /// Placeholder pattern failed to compile.
    #[error("placeholder pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Serializing a rendered object for output failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

impl From<tera::Error> for RenderError {
    fn from(err: tera::Error) -> Self {
        RenderError::Template(error_chain(&err))
    }
}

/// Flatten an error and its sources into `outer: inner: root`.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
