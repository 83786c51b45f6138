//! Compiler configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::diagnostic::CompilerError;
use crate::frontend;

/// Default output directory.
pub const DEFAULT_OUT_DIR: &str = "src/generated";

/// Default generator configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "fetchgen.config.json";

/// Path parameters supplied by the request context rather than the caller.
pub const DEFAULT_IGNORED_PATH_PARAMETERS: &[&str] = &["tenantId", "ownerId"];

/// Where the OpenAPI document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A local JSON or YAML file.
    Path(PathBuf),
    /// An `http(s)` URL, fetched before compilation.
    Url(String),
}

impl InputSource {
    /// Classifies a `--input` value.
    pub fn parse(input: &str) -> Result<Self, CompilerError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CompilerError::InvalidInput {
                input: input.to_string(),
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        for scheme in ["http://", "https://"] {
            if lower.starts_with(scheme) {
                if trimmed.len() == scheme.len() {
                    return Err(CompilerError::InvalidInput {
                        input: input.to_string(),
                    });
                }
                return Ok(InputSource::Url(trimmed.to_string()));
            }
        }
        Ok(InputSource::Path(PathBuf::from(trimmed)))
    }

    /// Name used for this input in messages.
    pub fn display_name(&self) -> String {
        match self {
            InputSource::Path(path) => path.display().to_string(),
            InputSource::Url(url) => url.clone(),
        }
    }
}

/// Configuration for the fetchgen compiler.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// OpenAPI document to generate from.
    pub input: InputSource,

    /// Directory generated files are written below.
    pub out_dir: PathBuf,

    /// Generator configuration file.
    pub config_path: PathBuf,

    /// Render everything but write nothing.
    pub dry_run: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            input: InputSource::Path(PathBuf::from("openapi.json")),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            dry_run: false,
        }
    }
}

/// Per-tag options for API clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientConfig {
    #[serde(default)]
    pub ignore_path_parameters: Option<Vec<String>>,
}

/// Generator options read from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default)]
    pub api_clients: BTreeMap<String, ApiClientConfig>,
}

impl GeneratorConfig {
    /// Loads the configuration file.
    ///
    /// A missing file is only an error when it was asked for explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, CompilerError> {
        if !path.exists() {
            if explicit {
                return Err(CompilerError::InvalidConfig {
                    path: path.to_path_buf(),
                    message: "file not found".to_string(),
                });
            }
            debug!(path = %path.display(), "no generator config, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| CompilerError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text, path)
    }

    /// Parses configuration text in JSON or YAML.
    pub fn parse(text: &str, path: &Path) -> Result<Self, CompilerError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        frontend::parse_text(text, &path.display().to_string()).map_err(|e| {
            CompilerError::InvalidConfig {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })
    }

    /// Path parameters left out of the methods generated for `tag`.
    pub fn ignored_path_parameters(&self, tag: &str) -> Vec<String> {
        self.api_clients
            .get(tag)
            .and_then(|c| c.ignore_path_parameters.clone())
            .unwrap_or_else(|| {
                DEFAULT_IGNORED_PATH_PARAMETERS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_source_classification() {
        assert_eq!(
            InputSource::parse("https://example.com/v3/api-docs").unwrap(),
            InputSource::Url("https://example.com/v3/api-docs".to_string())
        );
        assert_eq!(
            InputSource::parse(" ./openapi.yaml ").unwrap(),
            InputSource::Path(PathBuf::from("./openapi.yaml"))
        );
        assert!(InputSource::parse("   ").unwrap_err().is_invalid_input());
        assert!(InputSource::parse("http://").unwrap_err().is_invalid_input());
    }

    #[test]
    fn default_ignore_list() {
        let config = GeneratorConfig::default();
        assert_eq!(config.ignored_path_parameters("any"), vec!["tenantId", "ownerId"]);
    }

    #[test]
    fn per_tag_ignore_list_from_json_and_yaml() {
        let json = r#"{ "apiClients": { "cart": { "ignorePathParameters": ["userId"] } } }"#;
        let config = GeneratorConfig::parse(json, Path::new("fetchgen.config.json")).unwrap();
        assert_eq!(config.ignored_path_parameters("cart"), vec!["userId"]);
        assert_eq!(config.ignored_path_parameters("other"), vec!["tenantId", "ownerId"]);

        let yaml = "apiClients:\n  cart:\n    ignorePathParameters: []\n";
        let config = GeneratorConfig::parse(yaml, Path::new("fetchgen.config.yaml")).unwrap();
        assert!(config.ignored_path_parameters("cart").is_empty());
    }

    #[test]
    fn missing_default_config_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        assert_eq!(GeneratorConfig::load(&path, false).unwrap(), GeneratorConfig::default());
        assert!(matches!(
            GeneratorConfig::load(&path, true),
            Err(CompilerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn malformed_config_is_invalid() {
        let err = GeneratorConfig::parse("{ not json", Path::new("c.json")).unwrap_err();
        assert!(matches!(err, CompilerError::InvalidConfig { .. }));
    }
}
