//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/sitereport/config.toml)
//! 3. Project config (.sitereport/config.toml)
//! 4. Environment variables (SITEREPORT_* prefix, `__` separates nesting)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{ReportError, Result};

const ENV_PREFIX: &str = "SITEREPORT_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. SITEREPORT_REPORT__COST_MULTIPLIER -> report.cost_multiplier
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        Self::extract(figment)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path)),
        )
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| ReportError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/sitereport/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("sitereport"))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".sitereport")
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| ReportError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the default config into the global directory
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            ReportError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_default(&global_dir, force)
    }

    /// Write the default config into `.sitereport/` under the current directory
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::write_default(&Self::project_dir(), force)
    }

    fn write_default(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_toml())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Default config content (TOML)
    fn default_config_toml() -> &'static str {
        r#"# SiteReport Configuration
# Project settings in .sitereport/config.toml override the global file.
# API keys are read from OPENAI_API_KEY / GEMINI_API_KEY when not set here.

version = "1.0"

# Vision providers, tried in order for every image
[[providers.vision]]
provider = "openai"
model = "gpt-4o"

[[providers.vision]]
provider = "gemini"
model = "gemini-2.0-flash"

# Report writer (run with --template-only to skip it)
[providers.text]
provider = "openai"
model = "gpt-4o"

[report]
min_report_chars = 500
min_section_keywords = 5
report_max_tokens = 8192
cost_multiplier = 1.0
analysis_timeout_secs = 90
generation_timeout_secs = 300
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_toml_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, ConfigLoader::default_config_toml()).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.providers.vision.len(), 2);
        assert_eq!(config.providers.vision[1].provider, "gemini");
        assert_eq!(
            config.providers.text.as_ref().map(|t| t.provider.as_str()),
            Some("openai")
        );
        assert_eq!(config.report.min_section_keywords, 5);
    }

    #[test]
    fn test_load_from_file_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[[providers.vision]]
provider = "ollama"
model = "llava"

[report]
cost_multiplier = 1.35
location = "14 Mill Lane"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.providers.vision.len(), 1);
        assert_eq!(config.providers.vision[0].model.as_deref(), Some("llava"));
        assert!((config.report.cost_multiplier - 1.35).abs() < f64::EPSILON);
        assert_eq!(config.report.location.as_deref(), Some("14 Mill Lane"));
        assert_eq!(config.report.min_report_chars, 500);
    }

    #[test]
    fn test_load_from_file_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[report]\ncost_multiplier = -2.0\n").unwrap();

        assert!(matches!(
            ConfigLoader::load_from_file(&path),
            Err(ReportError::Config(_))
        ));
    }

    #[test]
    fn test_write_default_respects_force() {
        let dir = TempDir::new().unwrap();
        let path = ConfigLoader::write_default(dir.path(), false).unwrap();
        fs::write(&path, "version = \"custom\"\n").unwrap();

        ConfigLoader::write_default(dir.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"custom\"\n");

        ConfigLoader::write_default(dir.path(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[[providers.vision]]"));
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            jail.set_env("SITEREPORT_REPORT__COST_MULTIPLIER", "2.5");
            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert!((config.report.cost_multiplier - 2.5).abs() < f64::EPSILON);
            Ok(())
        });
    }
}
