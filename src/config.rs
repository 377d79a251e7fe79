//! Service configuration.
//!
//! Loaded from a JSON file (explicit path, `GROCERIES_CONFIG`, or the user
//! config dir), then overridden from the environment. Missing files fall back
//! to built-in defaults so a bare `groceries aggregate --rows fixture.json`
//! works without setup.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4";

pub const CONFIG_ENV: &str = "GROCERIES_CONFIG";
pub const SPREADSHEET_ID_ENV: &str = "GROCERIES_SPREADSHEET_ID";
pub const LM_COMMAND_ENV: &str = "GROCERIES_LM_COMMAND";
pub const SHEETS_TOKEN_ENV: &str = "GROCERIES_SHEETS_TOKEN";

/// Row ranges read from and written to the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeConfig {
    /// `(day, main, side)` rows.
    pub menu: String,
    /// `(dish, ingredients-csv)` rows.
    pub recipes: String,
    /// `(name, status, last_modified, add_count, preferred_store)` rows.
    pub shopping_list: String,
    /// Range new shopping-list rows are appended to.
    pub shopping_list_append: String,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            menu: "Menu!A2:C".to_string(),
            recipes: "Recipes!A2:B".to_string(),
            shopping_list: "Groceries!A3:E".to_string(),
            shopping_list_append: "Groceries!A:D".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Numeric id of the shopping-list sheet, used when sorting.
    #[serde(default)]
    pub sheet_id: u32,
    /// Rows above the first shopping-list data row.
    #[serde(default = "default_header_rows")]
    pub header_rows: u32,
    #[serde(default)]
    pub ranges: RangeConfig,
    /// Generative fallback command, split with shell-words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_command: Option<String>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_header_rows() -> u32 {
    2
}

/// Build the config used when no file is found.
pub fn default_config() -> ServiceConfig {
    ServiceConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        spreadsheet_id: String::new(),
        api_base: default_api_base(),
        sheet_id: 0,
        header_rows: default_header_rows(),
        ranges: RangeConfig::default(),
        lm_command: None,
    }
}

/// Resolve, load, override, and validate the effective config.
pub fn load_config(explicit: Option<&Path>) -> Result<ServiceConfig> {
    let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => env(CONFIG_ENV).map(PathBuf::from).or_else(user_config_path),
    };

    let mut config = match path {
        Some(path) => read_config(&path)?,
        None => default_config(),
    };
    apply_env_overrides(&mut config, env);
    validate_config(&config)?;
    Ok(config)
}

fn user_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("groceries").join("config.json");
    path.is_file().then_some(path)
}

/// Read and parse a config file.
pub fn read_config(path: &Path) -> Result<ServiceConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ServiceConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    Ok(config)
}

/// Apply environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut ServiceConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(id) = env(SPREADSHEET_ID_ENV) {
        config.spreadsheet_id = id;
    }
    if let Some(command) = env(LM_COMMAND_ENV) {
        config.lm_command = Some(command);
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.api_base.trim().is_empty() {
        return Err(anyhow!("api_base must be non-empty"));
    }
    let ranges = [
        ("ranges.menu", &config.ranges.menu),
        ("ranges.recipes", &config.ranges.recipes),
        ("ranges.shopping_list", &config.ranges.shopping_list),
        ("ranges.shopping_list_append", &config.ranges.shopping_list_append),
    ];
    for (field, range) in ranges {
        if range.trim().is_empty() {
            return Err(anyhow!("{field} must be non-empty"));
        }
    }
    if !config.ranges.shopping_list.contains('!') {
        return Err(anyhow!(
            "ranges.shopping_list must name its sheet (got {:?})",
            config.ranges.shopping_list
        ));
    }
    if let Some(command) = config.lm_command.as_deref() {
        let argv = shell_words::split(command)
            .with_context(|| format!("parse lm_command: {command}"))?;
        if argv.is_empty() {
            return Err(anyhow!("lm_command must be non-empty when set"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
