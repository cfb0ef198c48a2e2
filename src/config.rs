use crate::domain::DEFAULT_TAG_PREFIX;
use crate::error::{PublishError, Result};
use crate::git::DEFAULT_REMOTE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Branch checked out before anything is pushed
pub const DEFAULT_BRANCH: &str = "main";

/// Default number of extra push attempts on network failures
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// File name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "release-push.toml";

/// File name looked up in the user config directory
pub const USER_CONFIG_FILE: &str = ".release-push.toml";

/// Represents the complete configuration for release-push.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub publish: PublishSettings,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_tag_prefix() -> String {
    DEFAULT_TAG_PREFIX.to_string()
}

/// Settings controlling how refs are published.
///
/// Every field may be omitted from the file; command line flags override
/// whatever is loaded here.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PublishSettings {
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// The single remote all lookups and pushes go to
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Prefix release tags must carry before the semantic version
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        PublishSettings {
            dry_run: false,
            max_retries: default_max_retries(),
            remote: default_remote(),
            default_branch: default_branch(),
            tag_prefix: default_tag_prefix(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-push.toml` in current directory
/// 3. `.release-push.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(LOCAL_CONFIG_FILE).exists() {
        fs::read_to_string(LOCAL_CONFIG_FILE)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(USER_CONFIG_FILE);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    parse_config(&config_str)
}

/// Parses configuration from TOML text
pub fn parse_config(config_str: &str) -> Result<Config> {
    toml::from_str(config_str).map_err(|e| PublishError::config(e.to_string()))
}
