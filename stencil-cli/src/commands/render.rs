//! `stencil render <template>`: print rendered objects as YAML.

use anyhow::{bail, Context, Result};
use clap::Args;

use stencil_core::types::ValueMap;
use stencil_renderer::{Renderer, VariableMap};

use super::{GlobalArgs, Workspace};

/// Arguments for `stencil render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template name to render.
    pub template: String,

    /// Namespace the objects are placed in.
    #[arg(long, short, default_value = "default")]
    pub namespace: String,

    /// Parameter value as `key=value`; repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub values: Vec<(String, String)>,
}

impl RenderArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let workspace = Workspace::open(global)?;
        let template = workspace.template(&self.template)?;
        let values: ValueMap = self.values.into_iter().collect();
        let renderer = Renderer::new().context("failed to build renderer")?;

        let mut failed = 0usize;
        for object in &template.objects {
            let vars = VariableMap::bind(&template, object, &self.namespace, &values);
            match renderer.render(object, &vars, &self.namespace, &[]) {
                Ok(rendered) => {
                    let yaml = rendered
                        .to_yaml()
                        .with_context(|| format!("failed to encode {}", rendered.reference()))?;
                    print!("---\n{yaml}");
                }
                Err(err) => {
                    failed += 1;
                    eprintln!("{}: {err}", object.key_in(&self.namespace));
                }
            }
        }

        if failed > 0 {
            bail!("{failed} object(s) of template '{}' failed to render", template.name);
        }
        Ok(())
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("motd=a=b").unwrap(),
            ("motd".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_key_value("lives=").unwrap(), ("lives".to_string(), String::new()));
    }

    #[test]
    fn key_value_rejects_missing_equals_and_empty_key() {
        assert!(parse_key_value("lives").is_err());
        assert!(parse_key_value("=3").is_err());
    }
}
