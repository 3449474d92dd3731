use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable selecting the runtime mode. The front-end tooling sets it.
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Value of [`MODE_ENV_VAR`] that selects development mode.
const DEVELOPMENT_VALUE: &str = "development";

/// Vite dev server address. The port is fixed in the front-end's vite config.
pub const DEV_SERVER_URL: &str = "http://localhost:3000";

/// Whether the process serves the live dev server or the packaged bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Development,
    Packaged,
}

impl RuntimeMode {
    /// Read the mode from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    /// Development iff the variable is exactly "development"; anything else,
    /// including an unset variable, is packaged.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(DEVELOPMENT_VALUE) => RuntimeMode::Development,
            _ => RuntimeMode::Packaged,
        }
    }

    pub fn is_development(self) -> bool {
        self == RuntimeMode::Development
    }
}

/// Geometry and identity of the single application window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub label: String,
    pub title: String,
    pub width: f64,
    pub height: f64,
}

/// Process-wide configuration, built once at startup and passed to every
/// component that needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: RuntimeMode,
    pub dev_server_url: Url,
    pub window: WindowConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::Packaged,
            dev_server_url: Url::parse(DEV_SERVER_URL).expect("dev server URL constant is valid"),
            window: WindowConfig {
                label: "main".to_string(),
                title: "Shellkit".to_string(),
                width: 1280.0,
                height: 720.0,
            },
        }
    }
}

impl AppConfig {
    /// Defaults with the mode taken from the environment.
    pub fn from_env() -> Self {
        let config = Self::with_mode(RuntimeMode::from_env());
        tracing::debug!("Loaded config: {:?}", config);
        config
    }

    pub fn with_mode(mode: RuntimeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}
