//! Configuration management for ASDM.
//!
//! Parses `asdm.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `source.dir`
//! - `source.url`
//!
//! ## Example
//!
//! ```toml
//! [server]
//! port = 8910
//!
//! [source]
//! url = "${ASDM_CONTENT_URL:-https://asdm.example.com}"
//!
//! [i18n]
//! default_language = "zh-cn"
//!
//! [sections.docs]
//! prefix = "docs"
//! manifest = "/docs/{lang}/site-tree.yml"
//! order = "weighted"
//! empty_route = "first-document"
//! ```

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "asdm.toml";

/// Language codes the site ships content for.
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en-us", "zh-cn"];

/// Placeholder replaced by the language code in manifest locations.
pub const LANGUAGE_PLACEHOLDER: &str = "{lang}";

/// Default HTTP timeout for URL sources, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Read content from this directory (replaces any configured URL).
    pub source_dir: Option<PathBuf>,
    /// Fetch content from this base URL (replaces any configured directory).
    pub source_url: Option<String>,
    /// Override the default language.
    pub default_language: Option<String>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Content source configuration (relative paths as strings from TOML).
    source: SourceConfigRaw,
    /// Localization configuration.
    pub i18n: I18nConfig,
    /// Content sections keyed by name (e.g. `docs`, `blog`).
    pub sections: BTreeMap<String, SectionConfig>,

    /// Resolved content source (set after loading).
    #[serde(skip)]
    pub source_resolved: SourceConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8910,
        }
    }
}

/// Raw source configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceConfigRaw {
    dir: Option<String>,
    url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Where site content is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Local directory mirroring the public web root.
    Dir(PathBuf),
    /// Base URL of a static web server.
    Url(String),
}

/// Resolved content source configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Directory or URL.
    pub location: SourceLocation,
    /// Timeout for URL sources.
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: SourceLocation::Dir(PathBuf::from("public")),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Localization configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Language used when a location carries no language segment.
    pub default_language: String,
    /// Root location of translation bundles (`{root}/{lang}/{Namespace}.json`).
    pub locale_root: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_language: "en-us".to_owned(),
            locale_root: "/locale".to_owned(),
        }
    }
}

/// Order in which registry entries are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentOrder {
    /// By weight, unweighted last, then title.
    #[default]
    Weighted,
    /// Manifest order.
    Source,
}

/// What an empty route resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyRouteConfig {
    /// First document of the menu tree, else the first registry entry.
    #[default]
    FirstDocument,
    /// Nothing; the section shows its index view.
    Index,
}

/// Content section configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    /// Leading route segment (e.g. `docs`).
    pub prefix: String,
    /// Manifest location; `{lang}` is replaced by the language code.
    pub manifest: String,
    /// Registry order.
    #[serde(default)]
    pub order: DocumentOrder,
    /// Empty-route policy.
    #[serde(default)]
    pub empty_route: EmptyRouteConfig,
}

impl SectionConfig {
    /// Manifest location for a language.
    #[must_use]
    pub fn manifest_for(&self, language: &str) -> String {
        self.manifest.replace(LANGUAGE_PLACEHOLDER, language)
    }
}

/// Sections served when the config file declares none.
fn default_sections() -> BTreeMap<String, SectionConfig> {
    BTreeMap::from([
        (
            "docs".to_owned(),
            SectionConfig {
                prefix: "docs".to_owned(),
                manifest: "/docs/{lang}/site-tree.yml".to_owned(),
                order: DocumentOrder::Weighted,
                empty_route: EmptyRouteConfig::FirstDocument,
            },
        ),
        (
            "blog".to_owned(),
            SectionConfig {
                prefix: "blog".to_owned(),
                manifest: "/blogs/content/site-tree.yml".to_owned(),
                order: DocumentOrder::Source,
                empty_route: EmptyRouteConfig::Index,
            },
        ),
    ])
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`source.url`").
        field: String,
        /// Error message (e.g., "${`ASDM_CONTENT_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a language code the site ships content for.
fn require_language(value: &str, field: &str) -> Result<(), ConfigError> {
    if !SUPPORTED_LANGUAGES.contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{field} must be one of {}, got {value:?}",
            SUPPORTED_LANGUAGES.join(", ")
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `asdm.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the result (including CLI settings) fails validation.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(dir) = &settings.source_dir {
            self.source_resolved.location = SourceLocation::Dir(dir.clone());
        }
        if let Some(url) = &settings.source_url {
            self.source_resolved.location = SourceLocation::Url(url.clone());
        }
        if let Some(language) = &settings.default_language {
            self.i18n.default_language.clone_from(language);
        }
    }

    /// Look up a section by name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no section has that name.
    pub fn section(&self, name: &str) -> Result<&SectionConfig, ConfigError> {
        self.sections.get(name).ok_or_else(|| {
            ConfigError::Validation(format!(
                "unknown section {name:?} (configured: {})",
                self.sections.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            source: SourceConfigRaw::default(),
            i18n: I18nConfig::default(),
            sections: default_sections(),
            source_resolved: SourceConfig {
                location: SourceLocation::Dir(base.join("public")),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after applying CLI
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_source()?;
        self.validate_i18n()?;
        self.validate_sections()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate source configuration.
    fn validate_source(&self) -> Result<(), ConfigError> {
        if let SourceLocation::Url(url) = &self.source_resolved.location {
            require_non_empty(url, "source.url")?;
            require_http_url(url, "source.url")?;
        }
        if self.source_resolved.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "source.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Validate localization configuration.
    fn validate_i18n(&self) -> Result<(), ConfigError> {
        require_language(&self.i18n.default_language, "i18n.default_language")?;
        require_non_empty(&self.i18n.locale_root, "i18n.locale_root")?;
        Ok(())
    }

    /// Validate section configuration.
    fn validate_sections(&self) -> Result<(), ConfigError> {
        if self.sections.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [sections.<name>] table is required".to_owned(),
            ));
        }

        for (name, section) in &self.sections {
            require_non_empty(&section.prefix, &format!("sections.{name}.prefix"))?;
            if section.prefix.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "sections.{name}.prefix must be a single path segment"
                )));
            }
            require_non_empty(&section.manifest, &format!("sections.{name}.manifest"))?;
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref dir) = self.source.dir {
            self.source.dir = Some(expand::expand_env(dir, "source.dir")?);
        }
        if let Some(ref url) = self.source.url {
            self.source.url = Some(expand::expand_env(url, "source.url")?);
        }

        Ok(())
    }

    /// Resolve the content source relative to the config directory.
    ///
    /// Rejects configs that set both `source.dir` and `source.url`.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let location = match (&self.source.dir, &self.source.url) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Validation(
                    "[source] accepts either dir or url, not both".to_owned(),
                ));
            }
            (None, Some(url)) => SourceLocation::Url(url.trim_end_matches('/').to_owned()),
            (dir, None) => SourceLocation::Dir(config_dir.join(dir.as_deref().unwrap_or("public"))),
        };

        self.source_resolved = SourceConfig {
            location,
            timeout: Duration::from_secs(self.source.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        };

        Ok(())
    }
}
