use url::Url;

use crate::config::AppConfig;
use crate::error::{PathError, SessionError};
use crate::ipc::events::CHANNELS;
use crate::paths::AppPaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Terminated,
}

/// What ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    WindowClosed,
    AllWindowsClosed,
}

/// Where the window's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    DevServer(Url),
    PackagedFile(Url),
}

impl ContentSource {
    /// The dev server in development, otherwise the packaged UI. The packaged
    /// URL is the same one the frame validator trusts.
    pub fn for_config(config: &AppConfig, paths: &AppPaths) -> Result<Self, PathError> {
        if config.mode.is_development() {
            Ok(ContentSource::DevServer(config.dev_server_url.clone()))
        } else {
            Ok(ContentSource::PackagedFile(paths.ui_entry_url()?))
        }
    }

    pub fn url(&self) -> &Url {
        match self {
            ContentSource::DevServer(url) | ContentSource::PackagedFile(url) => url,
        }
    }
}

/// Lifecycle of the single application window.
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::NotStarted,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// NotStarted -> Running. Only one window may ever be opened.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::NotStarted => {
                self.state = SessionState::Running;
                Ok(())
            }
            SessionState::Running => Err(SessionError::AlreadyStarted),
            SessionState::Terminated => Err(SessionError::Terminated),
        }
    }

    /// Move to Terminated. Returns false if the session had already ended,
    /// so a second close signal does not trigger a second shutdown.
    pub fn terminate(&mut self, reason: ExitReason) -> bool {
        if self.state == SessionState::Terminated {
            return false;
        }
        tracing::info!("Session ending: {:?}", reason);
        self.state = SessionState::Terminated;
        true
    }
}

/// Initialization script for the window: a frozen descriptor of the runtime
/// followed by the compiled bridge script, which reads it to answer `isDev()`.
pub fn bridge_init_script(config: &AppConfig, bridge_script: &str) -> String {
    let descriptor = serde_json::json!({
        "mode": config.mode,
        "channels": CHANNELS,
    });
    format!(
        "Object.defineProperty(window, '__SHELLKIT__', {{ value: Object.freeze({}), writable: false }});\n{}",
        descriptor, bridge_script
    )
}

/// Start the session and open the main window pointed at the content source.
#[cfg(feature = "desktop")]
pub fn open_main_window(
    app: &tauri::AppHandle,
    state: &crate::ipc::AppState,
) -> Result<tauri::WebviewWindow, Box<dyn std::error::Error>> {
    state.session.lock().start()?;

    let source = ContentSource::for_config(&state.config, &state.paths)?;
    let script_path = state.paths.bridge_script();
    let script = std::fs::read_to_string(&script_path)
        .map_err(|e| format!("Failed to read bridge script {:?}: {}", script_path, e))?;
    let init_script = bridge_init_script(&state.config, &script);

    let window_config = &state.config.window;
    let window = tauri::WebviewWindowBuilder::new(
        app,
        &window_config.label,
        tauri::WebviewUrl::External(source.url().clone()),
    )
    .title(&window_config.title)
    .inner_size(window_config.width, window_config.height)
    .initialization_script(init_script.as_str())
    .build()?;

    tracing::info!("Opened window '{}' at {}", window_config.label, source.url());
    Ok(window)
}
