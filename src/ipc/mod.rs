pub mod bridge;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod events;

use parking_lot::Mutex;

pub use bridge::{send_notification, Bridge, InboundMessage, NotificationTarget};

use crate::config::AppConfig;
use crate::error::PathError;
use crate::frame::FrameValidator;
use crate::paths::AppPaths;
use crate::session::SessionController;

/// Application-wide state managed by Tauri.
pub struct AppState {
    pub config: AppConfig,
    pub paths: AppPaths,
    pub bridge: Bridge,
    pub session: Mutex<SessionController>,
}

impl AppState {
    /// Wire the validator and bridge from one set of paths so the trusted UI
    /// URL and the loaded UI URL cannot drift apart.
    pub fn new(config: AppConfig, paths: AppPaths) -> Result<Self, PathError> {
        let validator = FrameValidator::from_paths(&paths)?;
        Ok(Self {
            config,
            paths,
            bridge: Bridge::with_defaults(validator),
            session: Mutex::new(SessionController::new()),
        })
    }
}
