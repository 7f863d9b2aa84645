use anyhow::{Context, Result};
use crmdef::{MetadataRegistry, SeedDocument};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

pub const CONFIG_FILE: &str = "crmdef.toml";

/// Session context for crmdef commands
pub struct SessionContext {
    /// Directory relative paths in the config are resolved against
    pub base_dir: PathBuf,
    /// Config file that was loaded, if any
    pub config_path: Option<PathBuf>,
    pub config: CrmdefConfig,
}

/// Configuration stored in crmdef.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmdefConfig {
    #[serde(default)]
    pub seed: SeedSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSettings {
    #[serde(default = "default_standard_objects")]
    pub standard_objects: bool,
    /// Extra seed document, `.json` or `.toml`. May be `${VAR}`.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            standard_objects: default_standard_objects(),
            file: None,
        }
    }
}

fn default_standard_objects() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub no_color: bool,
}

impl SessionContext {
    /// Load the explicit config file, or search for crmdef.toml from the
    /// current directory upward
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let current_dir = std::env::current_dir().context("Failed to get current directory")?;
                Self::find_from(&current_dir)
            }
        }
    }

    /// Find config starting from the given directory. Falls back to defaults
    /// when no crmdef.toml exists in any ancestor.
    pub fn find_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
            if !current.pop() {
                return Ok(Self {
                    base_dir: start.to_path_buf(),
                    config_path: None,
                    config: CrmdefConfig::default(),
                });
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: CrmdefConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        log::debug!("loaded config from {}", path.display());
        Ok(Self {
            base_dir,
            config_path: Some(path.to_path_buf()),
            config,
        })
    }

    /// Seed file path with environment variables expanded
    pub fn seed_file(&self) -> Result<Option<PathBuf>> {
        let Some(raw) = self.config.seed.file.as_deref() else {
            return Ok(None);
        };
        let expanded = expand_env(raw)?;
        if expanded.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.base_dir.join(expanded)))
    }

    /// Build the registry a session starts from
    pub fn build_registry(&self) -> Result<MetadataRegistry> {
        let mut registry = MetadataRegistry::new();
        if self.config.seed.standard_objects {
            registry
                .load_seed(&SeedDocument::standard())
                .context("Failed to load standard objects")?;
        }
        if let Some(path) = self.seed_file()? {
            let document = SeedDocument::load(&path)
                .with_context(|| format!("Failed to read seed file {}", path.display()))?;
            let summary = registry
                .load_seed(&document)
                .with_context(|| format!("Failed to apply seed file {}", path.display()))?;
            log::info!(
                "seeded {} object(s) and {} field(s) from {}",
                summary.objects,
                summary.fields,
                path.display()
            );
        }
        Ok(registry)
    }
}

/// Expand a value of the form `${VAR}`; other values are returned unchanged
fn expand_env(value: &str) -> Result<String> {
    if let Some(var_name) = value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        std::env::var(var_name).with_context(|| format!("Environment variable {var_name} not set"))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrmdefConfig::default();
        assert!(config.seed.standard_objects);
        assert!(config.seed.file.is_none());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_config_parsing() {
        let config: CrmdefConfig = toml::from_str(
            r#"
            [seed]
            standard_objects = false
            file = "seed.toml"

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        assert!(!config.seed.standard_objects);
        assert_eq!(config.seed.file.as_deref(), Some("seed.toml"));
        assert_eq!(config.output.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_find_from_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[seed]\nstandard_objects = false\nfile = \"seed.json\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("seed.json"),
            r#"{ "objects": [ { "apiName": "Project__c", "label": "Project" } ] }"#,
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = SessionContext::find_from(&nested).unwrap();
        assert_eq!(ctx.config_path.as_deref(), Some(dir.path().join(CONFIG_FILE).as_path()));

        let registry = ctx.build_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_object("Project__c"));
    }

    #[test]
    fn test_missing_config_uses_standard_objects() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = SessionContext::find_from(dir.path()).unwrap();
        assert!(ctx.config_path.is_none());
        assert!(ctx.build_registry().unwrap().contains_object("Account"));
    }

    #[test]
    fn test_expand_env_passthrough() {
        assert_eq!(expand_env("seed.toml").unwrap(), "seed.toml");
        assert!(expand_env("${CRMDEF_TEST_SURELY_UNSET_VAR}").is_err());
    }
}
