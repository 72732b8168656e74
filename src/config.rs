//! Configuration for concord paths and pipeline settings.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CONCORD_HOME)
//! 2. Config file (.concord/config.yaml)
//! 3. Defaults (~/.concord)
//!
//! Config file discovery:
//! - Searches current directory and parents for .concord/config.yaml
//! - Paths in config file are relative to the config file's parent directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::conflict::DetectionThresholds;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub thresholds: Option<DetectionThresholds>,
    #[serde(default)]
    pub synthesis: Option<SynthesisConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Engine state directory (relative to config file)
    pub home: Option<String>,
    /// Panel definitions directory (relative to config file)
    pub panels: Option<String>,
    /// Stored sessions directory (relative to config file)
    pub sessions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to concord home (engine state)
    pub home: PathBuf,
    /// Absolute path to panel definitions
    pub panels: PathBuf,
    /// Absolute path to stored sessions
    pub sessions: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Detection thresholds applied when a panel does not override them
    pub thresholds: DetectionThresholds,
    /// Synthesis settings
    pub synthesis: SynthesisSettings,
}

#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: 45,
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".concord").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    // Default home directory
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".concord");

    let config_file = find_config_file();

    let (home, panels, sessions, thresholds, synthesis) = if let Some(ref config_path) =
        config_file
    {
        let config = load_config_file(config_path)?;

        // Base directory is the parent of .concord/ (i.e., grandparent of config.yaml)
        let base_dir = config_path
            .parent() // .concord/
            .and_then(|p| p.parent()) // project root
            .unwrap_or(Path::new("."));

        let home = if let Ok(env_home) = std::env::var("CONCORD_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            // home is relative to the .concord/ directory
            let concord_dir = config_path.parent().unwrap_or(Path::new("."));
            resolve_path(concord_dir, home_path)
        } else {
            default_home.clone()
        };

        let panels = if let Some(ref panels_path) = config.paths.panels {
            resolve_path(base_dir, panels_path)
        } else {
            home.join("panels")
        };

        let sessions = if let Some(ref sessions_path) = config.paths.sessions {
            resolve_path(base_dir, sessions_path)
        } else {
            home.join("sessions")
        };

        let thresholds = config.thresholds.unwrap_or_default();

        let synthesis = SynthesisSettings {
            endpoint: config.synthesis.as_ref().and_then(|s| s.endpoint.clone()),
            timeout_seconds: config
                .synthesis
                .as_ref()
                .and_then(|s| s.timeout_seconds)
                .unwrap_or(45),
        };

        (home, panels, sessions, thresholds, synthesis)
    } else {
        // No config file - use env vars or defaults
        let home = std::env::var("CONCORD_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home.clone());

        let panels = home.join("panels");
        let sessions = home.join("sessions");

        (
            home,
            panels,
            sessions,
            DetectionThresholds::default(),
            SynthesisSettings::default(),
        )
    };

    Ok(ResolvedConfig {
        home,
        panels,
        sessions,
        config_file,
        thresholds,
        synthesis,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

// ============================================================================
// Convenience functions
// ============================================================================

/// Get the concord home directory (engine state).
pub fn concord_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the panels directory ($CONCORD_HOME/panels)
pub fn panels_dir() -> Result<PathBuf> {
    Ok(config()?.panels.clone())
}

/// Get the sessions directory ($CONCORD_HOME/sessions)
pub fn sessions_dir() -> Result<PathBuf> {
    Ok(config()?.sessions.clone())
}
