//! Configuration system for runlens.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides. Files are read
//! from the platform config dir (`~/.config/runlens/config.toml` on Linux)
//! and `.runlens/config.toml` in the workspace directory.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub charts: ChartsConfig,
    #[serde(default)]
    pub runs: RunsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Where experiment and sweep logs are served from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the log server, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

/// Line chart styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Series colors for experiment comparisons, cycled by dataset index.
    pub experiment_palette: Vec<String>,
    /// Series colors for sweep runs.
    pub sweep_palette: Vec<String>,
    /// Above this many steps points are hidden.
    pub dense_step_threshold: u64,
    pub point_radius: u32,
    pub border_width: u32,
    pub animation_ms: u64,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            experiment_palette: ["red", "blue", "green", "gray", "pink"]
                .map(String::from)
                .to_vec(),
            sweep_palette: ["red", "blue", "green", "black", "rgb(217, 160, 4)"]
                .map(String::from)
                .to_vec(),
            dense_step_threshold: 25,
            point_radius: 3,
            border_width: 1,
            animation_ms: 500,
        }
    }
}

/// Sweep run table settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunsConfig {
    /// Runs per table/chart page.
    pub page_size: usize,
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            page_size: crate::pagination::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Dashboard host settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    /// Static frontend directory. Resolved next to the binary when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_dir: Option<PathBuf>,
    /// Experiments listed in the sidebar, in display order.
    #[serde(default)]
    pub experiment_ids: Vec<String>,
    /// Sweeps listed in the sidebar, in display order.
    #[serde(default)]
    pub sweep_ids: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8470,
            frontend_dir: None,
            experiment_ids: Vec::new(),
            sweep_ids: Vec::new(),
        }
    }
}

impl ViewerConfig {
    /// Reject settings the views cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.backend.base_url).map_err(|e| ConfigError::Invalid {
            message: format!("backend.base_url '{}': {e}", self.backend.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                message: format!(
                    "backend.base_url must be http or https, got '{}'",
                    url.scheme()
                ),
            });
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "backend.timeout_secs must be positive".to_string(),
            });
        }
        if self.runs.page_size == 0 {
            return Err(ConfigError::Invalid {
                message: "runs.page_size must be positive".to_string(),
            });
        }
        if self.charts.experiment_palette.is_empty() || self.charts.sweep_palette.is_empty() {
            return Err(ConfigError::Invalid {
                message: "chart palettes must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Load configuration from all layers.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ViewerConfig>,
) -> Result<ViewerConfig, Box<figment::Error>> {
    // RUNLENS_BACKEND__BASE_URL, RUNLENS_RUNS__PAGE_SIZE, etc.
    let env = Env::prefixed("RUNLENS_").split("__");
    load_layers(user_config_path().as_deref(), workspace, Some(env), overrides)
}

/// Merge defaults, the user file, the workspace file, `env`, then overrides.
fn load_layers(
    user_config: Option<&Path>,
    workspace: Option<&Path>,
    env: Option<Env>,
    overrides: Option<&ViewerConfig>,
) -> Result<ViewerConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(ViewerConfig::default()));

    // User-level config
    if let Some(user_config) = user_config
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(user_config));
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".runlens").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(env) = env {
        figment = figment.merge(env);
    }

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// `config.toml` in the platform config directory, if one can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "runlens", "runlens")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
