//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML file into the `AppConfig` DTO. No validation and no
//! defaults here: `NodeSettings::from_config` owns both.
//! 仅负责读取 TOML 并映射为 AppConfig，不做验证，不填默认值。

use std::path::{Path, PathBuf};

use anyhow::Context;
use lc_core::config::AppConfig;
use tracing::info;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "LANCLIP_CONFIG";

/// `$LANCLIP_CONFIG`, else `<config_dir>/lanclip/config.toml`.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("lanclip").join("config.toml"))
}

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// - File cannot be read (I/O error)
/// - Content is not valid TOML (parse error)
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

/// Like [`load_config`], but a missing file yields an empty config.
pub fn load_config_or_empty(config_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match config_path {
        Some(path) if path.exists() => {
            info!(path = %path.display(), "Loading config");
            load_config(path)
        }
        Some(path) => {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(AppConfig::empty())
        }
        None => Ok(AppConfig::empty()),
    }
}
