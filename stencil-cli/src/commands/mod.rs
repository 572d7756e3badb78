//! Subcommands and the flags they share.

pub mod apply;
pub mod diff;
pub mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stencil_core::types::{Template, TemplateName};
use stencil_core::{config, Catalog, EngineConfig, TemplateSource};
use stencil_sync::{FileStore, Reconciler};

/// Flags accepted by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Catalog root holding `templates/`, `params/` and `stencil.yaml`.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Object store directory. Defaults to `<root>/store`.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Catalog, store and config resolved from [`GlobalArgs`].
pub struct Workspace {
    pub catalog: Catalog,
    pub store: FileStore,
    pub config: EngineConfig,
}

impl Workspace {
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let config = config::load_at(&global.root)
            .with_context(|| format!("failed to load config under {}", global.root.display()))?;
        let store_dir = global
            .store
            .clone()
            .unwrap_or_else(|| global.root.join("store"));
        tracing::debug!(
            "catalog at {}, store at {}, group version {}",
            global.root.display(),
            store_dir.display(),
            config.group_version
        );
        Ok(Self {
            catalog: Catalog::new(&global.root),
            store: FileStore::new(store_dir),
            config,
        })
    }

    pub fn reconciler(&self) -> Result<Reconciler<&Catalog, &Catalog, &FileStore>> {
        Reconciler::new(&self.catalog, &self.catalog, &self.store, self.config.clone())
            .context("failed to build reconciler")
    }

    /// Template named `name`, or an error naming the catalog searched.
    pub fn template(&self, name: &str) -> Result<Template> {
        let wanted = TemplateName::from(name);
        self.catalog
            .list_templates()
            .context("failed to list templates")?
            .into_iter()
            .find(|t| t.name == wanted)
            .with_context(|| {
                format!(
                    "template '{name}' not found in {}",
                    self.catalog.templates_dir().display()
                )
            })
    }
}
