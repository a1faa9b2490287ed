//! Configuration file parser for ~/.config/stormwatch/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Widget identifiers
// ============================================================================

pub const STORM_REPORTS_ID: &str = "spc-reports";
pub const REPORTS_MAP_ID: &str = "spc-esri";
pub const RSS_FEED_ID: &str = "spc-rss";
pub const REPORT_TABLES_ID: &str = "spc-csv";

// ============================================================================
// Configuration Structs
// ============================================================================

/// A named group of widgets sharing one toggle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`. URL templates may contain
/// `{date}`, which expands to the `YYMMDD` key of the current report day.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix for proxied requests; the target URL is appended percent-encoded.
    /// Empty string fetches directly.
    pub proxy_url: String,

    /// Hours subtracted from local time when computing `{date}` keys.
    pub date_offset_hours: i64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Storm-report image shown by the `spc-reports` widget.
    pub storm_reports_image_url: String,

    /// Interactive report map shown by the `spc-esri` widget.
    pub interactive_map_url: String,

    /// RSS feed listed by the `spc-rss` widget.
    pub rss_url: String,

    /// Storm-report CSV tabulated by the `spc-csv` widget.
    pub csv_url: String,

    /// Widget groups. Replaces the default groups when present.
    pub groups: Vec<GroupSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: "https://api.allorigins.win/get?url=".to_string(),
            date_offset_hours: 6,
            request_timeout_secs: 30,
            storm_reports_image_url: "https://www.spc.noaa.gov/climo/reports/today.gif"
                .to_string(),
            interactive_map_url: "https://www.spc.noaa.gov/climo/gm.php?rpt={date}_rpts"
                .to_string(),
            rss_url: "https://www.spc.noaa.gov/products/spcrss.xml".to_string(),
            csv_url: "https://www.spc.noaa.gov/climo/reports/today.csv".to_string(),
            groups: vec![
                GroupSpec {
                    id: "spc-all".to_string(),
                    name: "All SPC widgets".to_string(),
                    members: vec![
                        STORM_REPORTS_ID.to_string(),
                        REPORTS_MAP_ID.to_string(),
                        RSS_FEED_ID.to_string(),
                        REPORT_TABLES_ID.to_string(),
                    ],
                },
                GroupSpec {
                    id: "spc-maps".to_string(),
                    name: "Report maps".to_string(),
                    members: vec![STORM_REPORTS_ID.to_string(), REPORTS_MAP_ID.to_string()],
                },
            ],
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "proxy_url",
                "date_offset_hours",
                "request_timeout_secs",
                "storm_reports_image_url",
                "interactive_map_url",
                "rss_url",
                "csv_url",
                "groups",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            groups = config.groups.len(),
            proxied = !config.proxy_url.is_empty(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.date_offset_hours, 6);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.proxy_url.starts_with("https://api.allorigins.win/"));
        assert!(config.interactive_map_url.contains("{date}"));
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[0].members.len(), 4);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/stormwatch_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.date_offset_hours, 6);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("stormwatch_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  \n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rss_url, Config::default().rss_url);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("stormwatch_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "proxy_url = \"\"\ndate_offset_hours = 0\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.proxy_url.is_empty());
        assert_eq!(config.date_offset_hours, 0);
        assert_eq!(config.request_timeout_secs, 30); // default
        assert_eq!(config.groups.len(), 2); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_groups_replace_defaults() {
        let dir = std::env::temp_dir().join("stormwatch_config_test_groups");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
rss_url = "https://example.com/rss.xml"

[[groups]]
id = "feeds"
name = "Feeds"
members = ["spc-rss", "spc-csv"]

[[groups]]
id = "empty"
name = "Nothing yet"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rss_url, "https://example.com/rss.xml");
        assert_eq!(
            config.groups,
            vec![
                GroupSpec {
                    id: "feeds".to_string(),
                    name: "Feeds".to_string(),
                    members: vec!["spc-rss".to_string(), "spc-csv".to_string()],
                },
                GroupSpec {
                    id: "empty".to_string(),
                    name: "Nothing yet".to_string(),
                    members: Vec::new(),
                },
            ]
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("stormwatch_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("stormwatch_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "date_offset_hours = 4\ntheme = \"dark\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.date_offset_hours, 4);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("stormwatch_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "date_offset_hours = \"six\"\n").unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("stormwatch_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
