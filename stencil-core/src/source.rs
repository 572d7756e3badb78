//! Template and parameter-record sources.
//!
//! # Catalog layout
//!
//! ```text
//! <root>/
//!   stencil.yaml              (optional engine config)
//!   templates/
//!     <template>.yaml         (one Template per file)
//!   params/
//!     <namespace>/<name>.yaml (one ParameterRecord per file, any depth)
//! ```
//!
//! Every listing re-reads the directory; nothing is cached.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{io_err, SourceError};
use crate::types::{ParameterRecord, Template};

// ---------------------------------------------------------------------------
// 1. Source traits
// ---------------------------------------------------------------------------

/// Lists every known template.
pub trait TemplateSource {
    fn list_templates(&self) -> Result<Vec<Template>, SourceError>;
}

/// Lists every known parameter record.
pub trait ParameterSource {
    fn list_records(&self) -> Result<Vec<ParameterRecord>, SourceError>;
}

impl<T: TemplateSource + ?Sized> TemplateSource for &T {
    fn list_templates(&self) -> Result<Vec<Template>, SourceError> {
        (**self).list_templates()
    }
}

impl<P: ParameterSource + ?Sized> ParameterSource for &P {
    fn list_records(&self) -> Result<Vec<ParameterRecord>, SourceError> {
        (**self).list_records()
    }
}

impl TemplateSource for Vec<Template> {
    fn list_templates(&self) -> Result<Vec<Template>, SourceError> {
        Ok(self.clone())
    }
}

impl ParameterSource for Vec<ParameterRecord> {
    fn list_records(&self) -> Result<Vec<ParameterRecord>, SourceError> {
        Ok(self.clone())
    }
}

// ---------------------------------------------------------------------------
// 2. Directory-backed catalog
// ---------------------------------------------------------------------------

/// YAML catalog rooted at a directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/templates/`
    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    /// `<root>/params/`
    pub fn params_dir(&self) -> PathBuf {
        self.root.join("params")
    }
}

impl TemplateSource for Catalog {
    fn list_templates(&self) -> Result<Vec<Template>, SourceError> {
        load_all(&self.templates_dir())
    }
}

impl ParameterSource for Catalog {
    fn list_records(&self) -> Result<Vec<ParameterRecord>, SourceError> {
        load_all(&self.params_dir())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Parse every `*.yaml` / `*.yml` under `dir`, sorted by path.
/// A missing directory is an empty catalog.
fn load_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, SourceError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_yaml_files(dir, &mut files)?;
    files.sort();

    let mut items = Vec::with_capacity(files.len());
    for path in files {
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let item = serde_yaml::from_str(&contents)
            .map_err(|source| SourceError::Parse { path, source })?;
        items.push(item);
    }
    Ok(items)
}

fn collect_yaml_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            collect_yaml_files(&path, out)?;
        } else if file_type.is_file() && is_yaml(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TemplateName;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn empty_catalog_when_dirs_missing() {
        let root = TempDir::new().unwrap();
        let catalog = Catalog::new(root.path());
        assert!(catalog.list_templates().unwrap().is_empty());
        assert!(catalog.list_records().unwrap().is_empty());
    }

    #[test]
    fn templates_sorted_by_path_and_non_yaml_skipped() {
        let root = TempDir::new().unwrap();
        write(root.path(), "templates/b.yaml", "name: b\n");
        write(root.path(), "templates/a.yml", "name: a\n");
        write(root.path(), "templates/README.md", "# not a template\n");

        let names: Vec<TemplateName> = Catalog::new(root.path())
            .list_templates()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec![TemplateName::from("a"), TemplateName::from("b")]);
    }

    #[test]
    fn records_found_recursively() {
        let root = TempDir::new().unwrap();
        write(
            root.path(),
            "params/default/otp.yaml",
            "name: otp\nnamespace: default\ntemplates:\n  - name: t1\n",
        );
        let records = Catalog::new(root.path()).list_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].namespace, "default");
    }

    #[test]
    fn vec_sources_return_their_contents() {
        let templates = vec![Template {
            name: TemplateName::from("t1"),
            description: String::new(),
            parameters: vec![],
            objects: vec![],
        }];
        assert_eq!(templates.list_templates().unwrap(), templates);
    }
}
