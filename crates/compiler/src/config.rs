//! Compiler configuration
//!
//! Settings that are not per-invocation CLI switches can live in a small
//! TOML file (`--config PATH`). CLI flags are applied on top of the loaded
//! configuration by the driver.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// path of the emitted object file
    pub output: PathBuf,
    /// treat warnings as errors (exit with failure if any warnings)
    pub deny_warnings: bool,
    /// whether an object file should be produced at all
    pub create_object_file: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            output: PathBuf::from("output.o"),
            deny_warnings: false,
            create_object_file: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Parse a configuration from TOML text. Missing fields keep their
    /// defaults, unknown fields are rejected.
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("failed to parse compiler config: {}", e))
    }

    /// Load a configuration file from disk.
    pub fn load_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read compiler config '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.output, PathBuf::from("output.o"));
        assert!(!config.deny_warnings);
        assert!(config.create_object_file);
    }

    #[test]
    fn test_from_toml() {
        let config = CompilerConfig::from_toml(
            "output = \"build/prog.o\"\ndeny_warnings = true\ncreate_object_file = false\n",
        )
        .unwrap();
        assert_eq!(config.output, PathBuf::from("build/prog.o"));
        assert!(config.deny_warnings);
        assert!(!config.create_object_file);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CompilerConfig::from_toml("deny_warnings = true\n").unwrap();
        assert!(config.deny_warnings);
        assert_eq!(config.output, PathBuf::from("output.o"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = CompilerConfig::from_toml("no_such_option = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = CompilerConfig::from_toml("not valid [ toml");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("failed to parse"));
    }
}
