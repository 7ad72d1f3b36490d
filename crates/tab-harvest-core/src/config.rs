use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CHROME_PROFILE_DIR: &str = "~/Library/Application Support/Google/Chrome/Default";
const ONETAB_EXTENSION_ID: &str = "chphlpgkkbolifaimnlloiipkdnihall";

/// Bounds used by the heuristic snapshot scanner. These were tuned against
/// real snapshot files and are not guaranteed by the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanThresholds {
    /// Exclusive upper bound on an embedded URL's byte length.
    pub max_url_len: u32,
    /// Number of bytes after a URL searched for a title length prefix.
    pub title_window: usize,
    /// Exclusive upper bound on a title's UTF-16 code unit count.
    pub max_title_chars: u32,
}

impl Default for ScanThresholds {
    fn default() -> Self {
        Self {
            max_url_len: 2048,
            title_window: 100,
            max_title_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sessions_dir: String,
    pub bookmarks_path: String,
    pub history_path: String,
    /// OneTab's LevelDB settings directory, or a file holding its `state`
    /// value. Empty disables the source.
    pub onetab_path: String,
    pub output_dir: String,
    pub session_patterns: Vec<String>,
    pub max_session_files: usize,
    pub history_limit: usize,
    pub scan: ScanThresholds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sessions_dir: format!("{}/Sessions", CHROME_PROFILE_DIR),
            bookmarks_path: format!("{}/Bookmarks", CHROME_PROFILE_DIR),
            history_path: format!("{}/History", CHROME_PROFILE_DIR),
            onetab_path: format!(
                "{}/Local Extension Settings/{}",
                CHROME_PROFILE_DIR, ONETAB_EXTENSION_ID
            ),
            output_dir: ".".to_string(),
            session_patterns: vec!["Session_*".to_string(), "Tabs_*".to_string()],
            max_session_files: 3,
            history_limit: 5000,
            scan: ScanThresholds::default(),
        }
    }
}

/// Load `Config.*` from the working directory if present, then apply
/// `HARVEST__*` environment overrides (e.g. `HARVEST__SCAN__TITLE_WINDOW`).
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("HARVEST")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("session_patterns")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let thresholds = ScanThresholds::default();
        assert_eq!(thresholds.max_url_len, 2048);
        assert_eq!(thresholds.title_window, 100);
        assert_eq!(thresholds.max_title_chars, 500);
    }

    #[test]
    fn test_default_config_patterns() {
        let config = AppConfig::default();
        assert_eq!(config.session_patterns, vec!["Session_*", "Tabs_*"]);
        assert_eq!(config.max_session_files, 3);
        assert!(config
            .onetab_path
            .ends_with("/Local Extension Settings/chphlpgkkbolifaimnlloiipkdnihall"));
        assert!(config.sessions_dir.ends_with("/Sessions"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                "max_session_files = 5\n[scan]\ntitle_window = 64\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.max_session_files, 5);
        assert_eq!(config.scan.title_window, 64);
        assert_eq!(config.scan.max_url_len, 2048);
        assert_eq!(config.history_limit, 5000);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/data"), PathBuf::from("/var/data"));
        assert_eq!(expand_home("relative/dir"), PathBuf::from("relative/dir"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/Sessions"), home.join("Sessions"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
