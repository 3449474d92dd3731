use serde_json::Value;
use tauri::{State, Webview};

use crate::frame::FrameDescriptor;
use crate::ipc::{AppState, InboundMessage};

/// The calling frame, identified by the webview's current URL. `None` when
/// the host cannot report one. Tauri doesn't expose sub-frames here, so an
/// iframe inside a trusted page is reported as the page itself.
fn sender_frame(webview: &Webview) -> Option<FrameDescriptor> {
    match webview.url() {
        Ok(url) => Some(FrameDescriptor::new(url.to_string())),
        Err(e) => {
            tracing::debug!("Could not resolve sending frame for '{}': {}", webview.label(), e);
            None
        }
    }
}

/// Request/response call from the page. A rejected origin rejects the
/// page's promise; an unidentifiable sender resolves it with `null`.
#[tauri::command]
pub fn invoke_request(
    webview: Webview,
    state: State<'_, AppState>,
    channel: String,
    args: Option<Value>,
) -> Result<Option<Value>, String> {
    let msg = InboundMessage::new(channel, sender_frame(&webview), args.unwrap_or(Value::Null));
    state.bridge.dispatch_request(msg).map_err(|e| e.to_string())
}

/// Fire-and-forget message from the page. There is nothing to answer, so
/// failures are logged and dropped.
#[tauri::command]
pub fn notify(webview: Webview, state: State<'_, AppState>, channel: String, payload: Value) {
    let msg = InboundMessage::new(channel, sender_frame(&webview), payload);
    if let Err(e) = state.bridge.dispatch_notification(msg) {
        tracing::warn!("Dropped notification: {}", e);
    }
}
