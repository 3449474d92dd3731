//! Origin checks for frames calling into the native process.
//!
//! Every inbound bridge message is checked here before any handler sees it.
//! A frame is trusted when it is the live dev server (development mode only)
//! or exactly the packaged UI entry document.

use url::Url;

use crate::config::RuntimeMode;
use crate::error::{BridgeError, PathError};
use crate::paths::AppPaths;

/// Host (with port) of the dev server. The port is fixed in the vite config.
pub const DEV_SERVER_HOST: &str = "localhost:3000";

/// The frame an inbound message claims to come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub url: String,
}

impl FrameDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone)]
pub struct FrameValidator {
    mode: RuntimeMode,
    ui_entry_url: Url,
}

impl FrameValidator {
    pub fn new(mode: RuntimeMode, ui_entry_url: Url) -> Self {
        Self { mode, ui_entry_url }
    }

    /// Build a validator trusting the same UI URL the window loads.
    pub fn from_paths(paths: &AppPaths) -> Result<Self, PathError> {
        Ok(Self::new(paths.mode(), paths.ui_entry_url()?))
    }

    pub fn ui_entry_url(&self) -> &Url {
        &self.ui_entry_url
    }

    /// Fails with [`BridgeError::SecurityViolation`] unless `frame_url` is a
    /// trusted origin. First match wins: the dev server host in development,
    /// then an exact match on the packaged UI URL.
    pub fn validate(&self, frame_url: &str) -> Result<(), BridgeError> {
        if self.mode.is_development() && host_of(frame_url).as_deref() == Some(DEV_SERVER_HOST) {
            return Ok(());
        }

        if frame_url == self.ui_entry_url.as_str() {
            return Ok(());
        }

        tracing::warn!("Rejected bridge call from untrusted frame {}", frame_url);
        Err(BridgeError::SecurityViolation {
            url: frame_url.to_string(),
        })
    }

    pub fn validate_frame(&self, frame: &FrameDescriptor) -> Result<(), BridgeError> {
        self.validate(&frame.url)
    }
}

/// `host[:port]` of a URL, with the scheme's default port omitted.
fn host_of(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
