//! Persisted configuration
//!
//! Mutation happens on live state ([`crate::MockOperation`],
//! [`crate::MockService`]); these structs are its pure serde projection.
//! Documents load from YAML, JSON or TOML chosen by file extension.

use crate::error::ConfigError;
use crate::response::ResponseDefinition;
use crate::strategy::DispatchStyle;
use mockops_model::{OperationDirection, Project, ResponseTemplate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl ConfigFormat {
    /// Format for a file path
    ///
    /// # Errors
    /// `ConfigError::UnknownFormat` for other extensions
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::UnknownFormat(path.to_path_buf())),
        }
    }

    /// Format name
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }

    fn parse<T: for<'de> Deserialize<'de>>(self, text: &str) -> Result<T, ConfigError> {
        let parsed = match self {
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse {
            format: self.name(),
            message,
        })
    }

    fn render<T: Serialize>(self, value: &T) -> Result<String, ConfigError> {
        let rendered = match self {
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
        };
        rendered.map_err(|message| ConfigError::Serialize {
            format: self.name(),
            message,
        })
    }
}

/// Runtime knobs shared by every mock operation of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    /// Seed new responses from the operation's response template
    pub generate_response_content: bool,
    /// Include optional elements when seeding
    pub include_optional_elements: bool,
    /// Style for operations created without a dispatch config
    pub default_dispatch_style: DispatchStyle,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            generate_response_content: true,
            include_optional_elements: false,
            default_dispatch_style: DispatchStyle::Sequence,
        }
    }
}

impl MockSettings {
    /// Create default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With optional elements included in generated content
    #[inline]
    #[must_use]
    pub fn with_optional_elements(mut self, include: bool) -> Self {
        self.include_optional_elements = include;
        self
    }

    /// With a default dispatch style
    #[inline]
    #[must_use]
    pub fn with_dispatch_style(mut self, style: DispatchStyle) -> Self {
        self.default_dispatch_style = style;
        self
    }
}

/// Request part a [`MatchRule`] inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Request body
    #[default]
    Body,
    /// Request path
    Path,
    /// HTTP method
    Method,
    /// Named header (see [`MatchRule::header`])
    Header,
}

/// One query-match rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    /// Inspected request part
    #[serde(default)]
    pub source: MatchSource,
    /// Header name when `source` is `header`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Regex searched for in the subject
    pub pattern: String,
    /// Response used on match
    pub response: String,
}

impl MatchRule {
    /// Rule over the body
    #[must_use]
    pub fn body(pattern: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            source: MatchSource::Body,
            header: None,
            pattern: pattern.into(),
            response: response.into(),
        }
    }

    /// Rule over the path
    #[must_use]
    pub fn path(pattern: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            source: MatchSource::Path,
            ..Self::body(pattern, response)
        }
    }

    /// Rule over a header
    #[must_use]
    pub fn header(
        name: impl Into<String>,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            source: MatchSource::Header,
            header: Some(name.into()),
            ..Self::body(pattern, response)
        }
    }
}

/// Dispatch configuration of a mock operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Selection style
    #[serde(default)]
    pub style: DispatchStyle,
    /// Script body for `script` style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Script language (registry default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Rules for `query_match` style
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<MatchRule>,
}

impl DispatchConfig {
    /// Config for a plain style
    #[inline]
    #[must_use]
    pub fn style(style: DispatchStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Query-match config
    #[inline]
    #[must_use]
    pub fn query_match(rules: Vec<MatchRule>) -> Self {
        Self {
            style: DispatchStyle::QueryMatch,
            rules,
            ..Self::default()
        }
    }

    /// Script config
    #[inline]
    #[must_use]
    pub fn script(script: impl Into<String>, language: Option<String>) -> Self {
        Self {
            style: DispatchStyle::Script,
            script: Some(script.into()),
            language,
            ..Self::default()
        }
    }
}

/// Persisted mock operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockOperationConfig {
    /// Mock operation name
    pub name: String,
    /// Bound interface name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// Bound operation name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Default response name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_response: Option<String>,
    /// Dispatch configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Responses in order
    #[serde(default)]
    pub responses: Vec<ResponseDefinition>,
}

impl MockOperationConfig {
    /// Config bound to `interface`/`operation`
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        interface: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            interface: Some(interface.into()),
            operation: Some(operation.into()),
            ..Self::default()
        }
    }

    /// Add a response
    #[inline]
    #[must_use]
    pub fn with_response(mut self, response: ResponseDefinition) -> Self {
        self.responses.push(response);
        self
    }

    /// Set the default response
    #[inline]
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_response = Some(name.into());
        self
    }

    /// Set the dispatch config
    #[inline]
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }
}

/// Operation entry of the interface catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationConfig {
    /// Operation name
    pub name: String,
    /// Exchange pattern
    #[serde(default)]
    pub direction: OperationDirection,
    /// Response skeleton
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_template: Option<ResponseTemplate>,
}

/// Interface entry of the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Interface name
    pub name: String,
    /// Operations
    #[serde(default)]
    pub operations: Vec<OperationConfig>,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Persisted mock service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockServiceConfig {
    /// Service name
    pub name: String,
    /// Mount path
    #[serde(default = "default_path")]
    pub path: String,
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Runtime settings
    #[serde(default)]
    pub settings: MockSettings,
    /// Interfaces the service mocks
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
    /// Mock operations
    #[serde(default)]
    pub operations: Vec<MockOperationConfig>,
}

impl MockServiceConfig {
    /// Empty service config
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: default_path(),
            port: default_port(),
            settings: MockSettings::default(),
            interfaces: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Load from a file, format chosen by extension
    ///
    /// # Errors
    /// `ConfigError::Io`, `ConfigError::UnknownFormat` or `ConfigError::Parse`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config = Self::parse(&text, format)?;
        tracing::info!(
            "loaded mock service [{}] with {} operation(s) from {}",
            config.name,
            config.operations.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse from text
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed input
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        format.parse(text)
    }

    /// Render as text
    ///
    /// # Errors
    /// `ConfigError::Serialize` if the format cannot represent the config
    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        format.render(self)
    }

    /// Build the live model described by `interfaces`
    #[must_use]
    pub fn build_project(&self) -> Project {
        let project = Project::new(self.name.clone());
        for iface in &self.interfaces {
            let interface_id = project.add_interface(iface.name.clone());
            for op in &iface.operations {
                let added = project
                    .add_operation(interface_id, op.name.clone(), op.direction)
                    .and_then(|operation_id| match &op.response_template {
                        Some(template) => project.set_response_template(
                            mockops_model::OperationRef::new(interface_id, operation_id),
                            template.clone(),
                        ),
                        None => Ok(()),
                    });
                if let Err(e) = added {
                    tracing::warn!("skipping operation [{}]: {}", op.name, e);
                }
            }
        }
        project
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockops_model::ServiceModel;
    use pretty_assertions::assert_eq;

    const YAML: &str = r#"
name: billing
port: 9090
interfaces:
  - name: BillingPort
    operations:
      - name: GetInvoice
        response_template:
          skeleton: "<invoice/>"
      - name: Ping
        direction: one_way
operations:
  - name: GetInvoice Mock
    interface: BillingPort
    operation: GetInvoice
    default_response: ok
    dispatch:
      style: query_match
      rules:
        - pattern: "<id>0</id>"
          response: fault
    responses:
      - name: ok
        content: "<invoice id='1'/>"
      - name: fault
        content: "<fault/>"
        http_status: 500
"#;

    fn sample() -> MockServiceConfig {
        MockServiceConfig::parse(YAML, ConfigFormat::Yaml).unwrap()
    }

    #[test]
    fn parses_yaml_with_defaults() {
        let config = sample();
        assert_eq!(config.path, "/");
        assert_eq!(config.port, 9090);
        assert!(config.settings.generate_response_content);

        let op = &config.operations[0];
        assert_eq!(op.dispatch.style, DispatchStyle::QueryMatch);
        assert_eq!(op.dispatch.rules[0].source, MatchSource::Body);
        assert_eq!(op.responses[1].http_status, 500);
        assert_eq!(op.responses[0].http_status, 200);
    }

    #[test]
    fn json_and_toml_projections_agree() {
        let config = sample();
        let json = config.render(ConfigFormat::Json).unwrap();
        let toml_text = config.render(ConfigFormat::Toml).unwrap();

        assert_eq!(MockServiceConfig::parse(&json, ConfigFormat::Json).unwrap(), config);
        assert_eq!(
            MockServiceConfig::parse(&toml_text, ConfigFormat::Toml).unwrap(),
            config
        );
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("a.xml")).is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.yaml");
        std::fs::write(&path, YAML).unwrap();

        let config = MockServiceConfig::load(&path).unwrap();
        assert_eq!(config.name, "billing");

        let missing = MockServiceConfig::load(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn parse_error_names_format() {
        let err = MockServiceConfig::parse("{", ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().starts_with("invalid json config"));
    }

    #[test]
    fn build_project_creates_catalogue() {
        let project = sample().build_project();
        let reference = project.resolve("BillingPort", "GetInvoice").unwrap();
        let op = project.operation(reference).unwrap();
        assert_eq!(op.response_template.unwrap().skeleton, "<invoice/>");

        let ping = project.resolve("BillingPort", "Ping").unwrap();
        assert_eq!(
            project.operation(ping).unwrap().direction,
            OperationDirection::OneWay
        );
    }
}
