use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::pipeline::{GenerationOptions, parse_problem_base};
use crate::problem::{DEFAULT_PROBLEM_BASE, ProblemRfc};
use crate::target::GenerationMode;

/// Project configuration loaded from `.shapegen.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShapegenConfig {
    pub package: String,
    pub model_package: Option<String>,
    pub service_package: Option<String>,
    pub problem_base: String,
    pub service_suffix: String,
    pub mode: GenerationMode,
    /// Media type priority, most preferred first.
    pub media_types: Vec<String>,
    /// Option names to switch on, by their CLI spelling.
    pub enable: Vec<String>,
    /// Option names to switch off; wins over `enable`.
    pub disable: Vec<String>,
    pub problem: ProblemConfig,
}

impl Default for ShapegenConfig {
    fn default() -> Self {
        Self {
            package: "io.example".to_string(),
            model_package: None,
            service_package: None,
            problem_base: DEFAULT_PROBLEM_BASE.to_string(),
            service_suffix: "API".to_string(),
            mode: GenerationMode::Client,
            media_types: Vec::new(),
            enable: Vec::new(),
            disable: Vec::new(),
            problem: ProblemConfig::default(),
        }
    }
}

impl ShapegenConfig {
    /// Options for one invocation; the caller applies flag overrides on top.
    pub fn options(&self) -> Result<GenerationOptions, ConfigError> {
        Ok(GenerationOptions {
            package: self.package.clone(),
            model_package: self.model_package.clone(),
            service_package: self.service_package.clone(),
            problem_base: parse_problem_base(&self.problem_base)?,
            mode: self.mode,
            media_types: self.media_types.clone(),
            service_suffix: self.service_suffix.clone(),
            problem_rfc: self.problem.rfc,
        })
    }
}

/// Problem payload settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    pub rfc: ProblemRfc,
    /// Target problem library; targets with a single library ignore it.
    pub library: Option<String>,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".shapegen.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ShapegenConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: ShapegenConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# shapegen configuration
package: io.example
# model-package: io.example.model     # defaults to package
# service-package: io.example.api     # defaults to package
problem-base: http://example.com/
service-suffix: API
mode: client                          # client | server

media-types: []                       # priority order, e.g. [application/json, application/cbor]
enable: []                            # target option names, e.g. [validation-constraints]
disable: []

problem:
  rfc: rfc9457                        # rfc7807 | rfc9457
  # library: quarkus                  # jvm: quarkus | sunday | zalando
"#
}
