use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level project configuration loaded from `.oir.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OirConfig {
    pub input: String,
    pub languages: Vec<TargetLanguage>,
    pub naming: NamingConfig,
    pub validation: ValidationConfig,
}

impl Default for OirConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            languages: TargetLanguage::ALL.to_vec(),
            naming: NamingConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl OirConfig {
    /// The transform options this configuration asks for.
    pub fn codegen_options(&self) -> CodeGenOptions {
        CodeGenOptions {
            naming_strategy: self.naming.strategy,
            languages: self.languages.clone(),
            verify_deduplicated_operation_ids: self.validation.verify_deduplicated_operation_ids,
        }
    }
}

/// A language the IR carries type and identifier mappings for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TargetLanguage {
    Typescript,
    Python,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 2] = [TargetLanguage::Typescript, TargetLanguage::Python];
}

/// Naming strategy for operations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
}

/// How operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    UseOperationId,
    UseRouteBased,
}

/// Extra checks applied while building the IR.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject two operations carrying the same `x-aws-nx-deduplicated-op-id`.
    pub verify_deduplicated_operation_ids: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            verify_deduplicated_operation_ids: true,
        }
    }
}

/// Options consumed by the transform pipeline.
#[derive(Debug, Clone)]
pub struct CodeGenOptions {
    pub naming_strategy: NamingStrategy,
    pub languages: Vec<TargetLanguage>,
    pub verify_deduplicated_operation_ids: bool,
}

impl Default for CodeGenOptions {
    fn default() -> Self {
        OirConfig::default().codegen_options()
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oir.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OirConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: OirConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oir configuration
input: openapi.yaml
languages: [typescript, python]

naming:
  strategy: use_operation_id  # use_operation_id | use_route_based

validation:
  # reject operations sharing an x-aws-nx-deduplicated-op-id
  verify_deduplicated_operation_ids: true
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OirConfig::default();
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(
            config.languages,
            vec![TargetLanguage::Typescript, TargetLanguage::Python]
        );
        assert_eq!(config.naming.strategy, NamingStrategy::UseOperationId);
        assert!(config.validation.verify_deduplicated_operation_ids);
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
input: spec.yaml
languages: [python]
naming:
  strategy: use_route_based
validation:
  verify_deduplicated_operation_ids: false
"#;
        let config: OirConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.input, "spec.yaml");
        assert_eq!(config.languages, vec![TargetLanguage::Python]);
        assert_eq!(config.naming.strategy, NamingStrategy::UseRouteBased);

        let options = config.codegen_options();
        assert_eq!(options.naming_strategy, NamingStrategy::UseRouteBased);
        assert!(!options.verify_deduplicated_operation_ids);
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = "input: api.yaml\n";
        let config: OirConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.input, "api.yaml");
        assert_eq!(config.languages.len(), 2);
        assert!(config.validation.verify_deduplicated_operation_ids);
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config: OirConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.input, OirConfig::default().input);
        assert_eq!(config.languages, OirConfig::default().languages);
    }

    #[test]
    fn test_load_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(load_config(&path).unwrap().is_none());

        fs::write(&path, "naming:\n  strategy: use_route_based\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.naming.strategy, NamingStrategy::UseRouteBased);

        fs::write(&path, "languages: [cobol]\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.starts_with("failed to parse config"));
    }
}
