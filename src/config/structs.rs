use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{LoaderError, Result};
use crate::loader::{ApiOptions, CleanupRules, DEFAULT_FONT_HOST, DEFAULT_SDK_HOST};
use crate::signal::LocaleSignal;
use crate::system::reload::LoaderSettings;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "maps-loader.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "MAPS_LOADER";

/// Static configuration (TOML file + environment)
///
/// - loader: SDK credentials, libraries, initial locale and hosts
/// - logging: log level, format and output
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// Loads `maps-loader.toml` and the environment, falling back to
    /// defaults if either cannot be read.
    ///
    /// Precedence: ENV > file > defaults. Environment variables use the
    /// `MAPS_LOADER` prefix and `__` as separator, e.g.
    /// `MAPS_LOADER__LOADER__API_KEY=...`.
    pub fn load() -> Self {
        match Self::load_from(DEFAULT_CONFIG_PATH) {
            Ok(config) => {
                if Path::new(DEFAULT_CONFIG_PATH).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", DEFAULT_CONFIG_PATH);
                }
                config
            }
            Err(e) => {
                // Logging is not up yet at this point
                eprintln!("[ERROR] Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    /// Same as [`StaticConfig::load`] for an explicit file, with errors
    /// reported instead of swallowed. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("loader.libraries")
                    .with_list_parse_key("loader.map_ids")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize::<StaticConfig>()?)
    }

    /// Sample TOML configuration with every default filled in
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// SDK loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub libraries: Vec<String>,
    /// Locale used until the host sets one
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub auth_referrer_policy: Option<String>,
    #[serde(default)]
    pub map_ids: Vec<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub solution_channel: Option<String>,
    /// Passthrough query parameters, camelCase keys
    #[serde(default)]
    pub extra: IndexMap<String, String>,
    #[serde(default = "default_sdk_host")]
    pub sdk_host: String,
    #[serde(default = "default_font_host")]
    pub font_host: String,
}

impl LoaderConfig {
    /// Host-facing options built from this configuration
    ///
    /// # Errors
    /// * `LoaderError::Validation` - the API key is empty
    pub fn api_options(&self) -> Result<ApiOptions> {
        if self.api_key.trim().is_empty() {
            return Err(LoaderError::validation(
                "loader.api_key must be set to load the Maps SDK",
            ));
        }

        Ok(ApiOptions {
            api_key: self.api_key.trim().to_string(),
            version: self.version.clone(),
            libraries: self.libraries.clone(),
            region: self.region.clone(),
            auth_referrer_policy: self.auth_referrer_policy.clone(),
            map_ids: self.map_ids.clone(),
            channel: self.channel.clone(),
            solution_channel: self.solution_channel.clone(),
            extra: self.extra.clone(),
            ..ApiOptions::default()
        })
    }

    /// Fresh locale signal starting at the configured language
    pub fn locale_signal(&self) -> LocaleSignal {
        LocaleSignal::new(self.language.trim())
    }

    pub fn cleanup_rules(&self) -> CleanupRules {
        CleanupRules::new(self.sdk_host.as_str(), self.font_host.as_str())
    }

    pub fn settings(&self) -> LoaderSettings {
        LoaderSettings {
            sdk_host: self.sdk_host.clone(),
            cleanup: self.cleanup_rules(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Log file; console when unset or empty
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_language() -> String {
    "en".to_string()
}

fn default_sdk_host() -> String {
    DEFAULT_SDK_HOST.to_string()
}

fn default_font_host() -> String {
    DEFAULT_FONT_HOST.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            version: None,
            libraries: Vec::new(),
            language: default_language(),
            region: None,
            auth_referrer_policy: None,
            map_ids: Vec::new(),
            channel: None,
            solution_channel: None,
            extra: IndexMap::new(),
            sdk_host: default_sdk_host(),
            font_host: default_font_host(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.loader.language, "en");
        assert_eq!(config.loader.sdk_host, "maps.googleapis.com");
        assert_eq!(config.loader.font_host, "fonts.googleapis.com");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_api_options_require_key() {
        let config = LoaderConfig::default();
        assert!(matches!(
            config.api_options(),
            Err(LoaderError::Validation(_))
        ));

        let config = LoaderConfig {
            api_key: "  abc ".to_string(),
            libraries: vec!["places".to_string()],
            ..LoaderConfig::default()
        };
        let options = config.api_options().unwrap();
        assert_eq!(options.api_key, "abc");
        assert_eq!(options.libraries, vec!["places"]);
    }

    #[test]
    fn test_api_options_carry_every_field() {
        let config = LoaderConfig {
            api_key: "k".to_string(),
            language: "ja".to_string(),
            auth_referrer_policy: Some("origin".to_string()),
            channel: Some("web".to_string()),
            solution_channel: Some("GMP_cfg".to_string()),
            ..LoaderConfig::default()
        };
        let load = config.api_options().unwrap().with_language("ja");

        let fields = load.fields();
        let get = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("authReferrerPolicy"), Some("origin"));
        assert_eq!(get("channel"), Some("web"));
        assert_eq!(get("solutionChannel"), Some("GMP_cfg"));
        assert_eq!(get("language"), Some("ja"));
    }

    #[test]
    fn test_locale_signal_starts_at_configured_language() {
        let config = LoaderConfig {
            language: " pt-BR ".to_string(),
            ..LoaderConfig::default()
        };
        assert_eq!(config.locale_signal().get(), "pt-BR");
        assert_eq!(LoaderConfig::default().locale_signal().get(), "en");
    }

    #[test]
    fn test_settings_follow_hosts() {
        let config = LoaderConfig {
            sdk_host: "maps.internal.test".to_string(),
            ..LoaderConfig::default()
        };
        let settings = config.settings();
        assert_eq!(settings.sdk_host, "maps.internal.test");
        assert!(settings.cleanup.hosts.contains(&"maps.internal.test".to_string()));
        assert!(settings.cleanup.hosts.contains(&"fonts.googleapis.com".to_string()));
    }

    #[test]
    fn test_sample_config_round_trips() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[loader]"));
        assert!(sample.contains("[logging]"));

        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.loader.sdk_host, "maps.googleapis.com");
    }
}
