pub mod config;
pub mod error;
pub mod frame;
pub mod ipc;
pub mod paths;
pub mod session;

pub use config::{AppConfig, RuntimeMode};
pub use error::{BridgeError, PathError, SessionError};
pub use frame::{FrameDescriptor, FrameValidator};
pub use ipc::{send_notification, AppState, Bridge, InboundMessage, NotificationTarget};
pub use paths::AppPaths;
pub use session::{ContentSource, ExitReason, SessionController, SessionState};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shellkit_lib=info".into()),
        )
        .init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::{Manager, RunEvent, WindowEvent};

    init_logging();

    let config = AppConfig::from_env();
    tracing::info!("Starting shellkit in {:?} mode", config.mode);

    let app = tauri::Builder::default()
        .invoke_handler(tauri::generate_handler![
            ipc::commands::bridge::invoke_request,
            ipc::commands::bridge::notify,
        ])
        .setup(move |app| {
            let resource_dir = app.path().resource_dir().ok();
            let paths = AppPaths::discover(config.mode, resource_dir.as_deref())?;
            app.manage(AppState::new(config, paths)?);

            let state = app.state::<AppState>();
            session::open_main_window(app.handle(), &state)?;

            tracing::info!("Shellkit setup complete");
            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::Destroyed = event {
                let Some(state) = window.try_state::<AppState>() else {
                    return;
                };
                let first_close = state.session.lock().terminate(ExitReason::WindowClosed);
                if first_close {
                    window.app_handle().exit(0);
                }
            }
        })
        .build(tauri::generate_context!())
        .expect("Failed to build shellkit");

    app.run(|handle, event| {
        if let RunEvent::ExitRequested { .. } = event {
            if let Some(state) = handle.try_state::<AppState>() {
                state.session.lock().terminate(ExitReason::AllWindowsClosed);
            }
        }
    });
}
