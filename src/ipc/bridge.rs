use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::events::{Channel, RequestChannel, Test};
use crate::error::BridgeError;
use crate::frame::{FrameDescriptor, FrameValidator};

type RequestHandler = Arc<dyn Fn(Value) -> Result<Value, BridgeError> + Send + Sync>;
type NotificationListener = Arc<dyn Fn(Value) -> Result<(), BridgeError> + Send + Sync>;

/// A message arriving from the page.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel: String,
    /// Frame the message came from. `None` when the host could not tell.
    pub sender: Option<FrameDescriptor>,
    pub payload: Value,
}

impl InboundMessage {
    pub fn new(channel: impl Into<String>, sender: Option<FrameDescriptor>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            sender,
            payload,
        }
    }
}

/// Anything that can receive a notification pushed from the native side.
pub trait NotificationTarget {
    fn deliver(&self, channel: &str, payload: Value) -> Result<(), BridgeError>;
}

#[cfg(feature = "desktop")]
impl<R: tauri::Runtime> NotificationTarget for tauri::WebviewWindow<R> {
    fn deliver(&self, channel: &str, payload: Value) -> Result<(), BridgeError> {
        use tauri::Emitter;

        self.emit_to(self.label(), channel, payload)
            .map_err(|e| BridgeError::Delivery {
                channel: channel.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Handler table for inbound bridge traffic. Every inbound message passes the
/// frame validator before a handler sees it.
pub struct Bridge {
    validator: FrameValidator,
    requests: RwLock<HashMap<&'static str, RequestHandler>>,
    notifications: RwLock<HashMap<&'static str, Vec<NotificationListener>>>,
}

impl Bridge {
    pub fn new(validator: FrameValidator) -> Self {
        Self {
            validator,
            requests: RwLock::new(HashMap::new()),
            notifications: RwLock::new(HashMap::new()),
        }
    }

    /// A bridge with the built-in `test` request handler registered.
    pub fn with_defaults(validator: FrameValidator) -> Self {
        let bridge = Self::new(validator);
        bridge.register_request_handler::<Test, _>(|()| Test::NAME.to_string());
        bridge
    }

    pub fn validator(&self) -> &FrameValidator {
        &self.validator
    }

    /// Answer requests on channel `C`. Replaces any earlier handler.
    pub fn register_request_handler<C, F>(&self, handler: F)
    where
        C: RequestChannel,
        F: Fn(C::Args) -> C::Payload + Send + Sync + 'static,
    {
        let erased: RequestHandler = Arc::new(move |raw| {
            let args: C::Args =
                serde_json::from_value(raw).map_err(|source| BridgeError::InvalidPayload {
                    channel: C::NAME.to_string(),
                    source,
                })?;
            serde_json::to_value(handler(args)).map_err(|source| BridgeError::Serialize {
                channel: C::NAME.to_string(),
                source,
            })
        });

        if self.requests.write().insert(C::NAME, erased).is_some() {
            tracing::warn!("Replaced request handler for channel '{}'", C::NAME);
        } else {
            tracing::debug!("Registered request handler for channel '{}'", C::NAME);
        }
    }

    /// Listen for fire-and-forget notifications on channel `C`. Listeners run
    /// in registration order.
    pub fn register_notification_handler<C, F>(&self, listener: F)
    where
        C: Channel,
        F: Fn(C::Payload) + Send + Sync + 'static,
    {
        let erased: NotificationListener = Arc::new(move |raw| {
            let payload: C::Payload =
                serde_json::from_value(raw).map_err(|source| BridgeError::InvalidPayload {
                    channel: C::NAME.to_string(),
                    source,
                })?;
            listener(payload);
            Ok(())
        });

        self.notifications
            .write()
            .entry(C::NAME)
            .or_default()
            .push(erased);
        tracing::debug!("Registered notification listener for channel '{}'", C::NAME);
    }

    /// Run the request handler for `msg`.
    ///
    /// Returns `Ok(None)` without calling anything when the sender is unknown.
    /// An untrusted sender fails with `SecurityViolation` and the handler is
    /// never reached.
    pub fn dispatch_request(&self, msg: InboundMessage) -> Result<Option<Value>, BridgeError> {
        let Some(sender) = msg.sender.as_ref() else {
            tracing::debug!("Dropped '{}' request with no sending frame", msg.channel);
            return Ok(None);
        };
        self.validator.validate_frame(sender)?;

        // Clone the handler out so it runs without the table lock held.
        let handler = self
            .requests
            .read()
            .get(msg.channel.as_str())
            .cloned()
            .ok_or_else(|| BridgeError::UnknownChannel(msg.channel.clone()))?;

        handler(msg.payload).map(Some)
    }

    /// Deliver `msg` to every listener on its channel. Same gating as
    /// [`Self::dispatch_request`]; a channel with no listeners is not an error.
    pub fn dispatch_notification(&self, msg: InboundMessage) -> Result<(), BridgeError> {
        let Some(sender) = msg.sender.as_ref() else {
            tracing::debug!("Dropped '{}' notification with no sending frame", msg.channel);
            return Ok(());
        };
        self.validator.validate_frame(sender)?;

        let listeners = self
            .notifications
            .read()
            .get(msg.channel.as_str())
            .cloned()
            .unwrap_or_default();

        if listeners.is_empty() {
            tracing::debug!("No listeners for '{}' notification", msg.channel);
        }
        // A failing listener doesn't stop the rest; the first error is returned.
        let mut first_err = None;
        for listener in listeners {
            if let Err(e) = listener(msg.payload.clone()) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Push `payload` to `target` on channel `C`. Outbound traffic comes from
/// the native process and is not validated.
pub fn send_notification<C, T>(target: &T, payload: &C::Payload) -> Result<(), BridgeError>
where
    C: Channel,
    T: NotificationTarget + ?Sized,
{
    let value = serde_json::to_value(payload).map_err(|source| BridgeError::Serialize {
        channel: C::NAME.to_string(),
        source,
    })?;
    target.deliver(C::NAME, value)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::config::RuntimeMode;
    use crate::paths::{test_root, AppPaths};

    fn trusted() -> String {
        AppPaths::new(test_root(), RuntimeMode::Packaged)
            .ui_entry_url()
            .unwrap()
            .to_string()
    }

    fn untrusted() -> String {
        AppPaths::new(test_root(), RuntimeMode::Packaged)
            .ui_entry_url()
            .unwrap()
            .join("evil.html")
            .unwrap()
            .to_string()
    }

    fn validator(mode: RuntimeMode) -> FrameValidator {
        FrameValidator::from_paths(&AppPaths::new(test_root(), mode)).expect("absolute root")
    }

    fn bridge(mode: RuntimeMode) -> Bridge {
        Bridge::new(validator(mode))
    }

    fn message(sender: Option<&str>, payload: Value) -> InboundMessage {
        InboundMessage::new(Test::NAME, sender.map(FrameDescriptor::new), payload)
    }

    fn counting_test_handler(bridge: &Bridge) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        bridge.register_request_handler::<Test, _>(move |()| {
            counter.fetch_add(1, Ordering::SeqCst);
            "test".to_string()
        });
        calls
    }

    #[derive(Default)]
    struct RecordingTarget {
        delivered: Mutex<Vec<(String, Value)>>,
    }

    impl NotificationTarget for RecordingTarget {
        fn deliver(&self, channel: &str, payload: Value) -> Result<(), BridgeError> {
            self.delivered.lock().push((channel.to_string(), payload));
            Ok(())
        }
    }

    #[test]
    fn default_test_channel_answers_trusted_frame() {
        let bridge = Bridge::with_defaults(validator(RuntimeMode::Packaged));

        let response = bridge
            .dispatch_request(message(Some(trusted().as_str()), Value::Null))
            .expect("trusted frame should pass");
        assert_eq!(response, Some(json!("test")));
    }

    #[test]
    fn untrusted_frame_never_reaches_request_handler() {
        let bridge = bridge(RuntimeMode::Packaged);
        let calls = counting_test_handler(&bridge);

        let err = bridge
            .dispatch_request(message(Some(untrusted().as_str()), Value::Null))
            .expect_err("untrusted frame must be rejected");
        assert!(err.is_security_violation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn request_without_sender_is_dropped_silently() {
        let bridge = bridge(RuntimeMode::Packaged);
        let calls = counting_test_handler(&bridge);

        let response = bridge
            .dispatch_request(message(None, Value::Null))
            .expect("missing sender is not an error");
        assert_eq!(response, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dev_server_frame_reaches_handler_in_development() {
        let bridge = bridge(RuntimeMode::Development);
        let calls = counting_test_handler(&bridge);

        let response = bridge
            .dispatch_request(message(Some("http://localhost:3000/"), Value::Null))
            .expect("dev server is trusted in development");
        assert_eq!(response, Some(json!("test")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_channel_is_reported_after_validation() {
        let bridge = bridge(RuntimeMode::Packaged);

        let err = bridge
            .dispatch_request(InboundMessage::new(
                "missing",
                Some(FrameDescriptor::new(trusted())),
                Value::Null,
            ))
            .expect_err("no handler registered");
        assert!(matches!(err, BridgeError::UnknownChannel(ref name) if name == "missing"));

        let err = bridge
            .dispatch_request(InboundMessage::new(
                "missing",
                Some(FrameDescriptor::new(untrusted())),
                Value::Null,
            ))
            .expect_err("untrusted frame");
        assert!(err.is_security_violation(), "validation runs before channel lookup");
    }

    #[test]
    fn mismatched_request_args_are_rejected() {
        let bridge = bridge(RuntimeMode::Packaged);
        let calls = counting_test_handler(&bridge);

        let err = bridge
            .dispatch_request(message(Some(trusted().as_str()), json!({ "unexpected": true })))
            .expect_err("test channel takes no arguments");
        assert!(matches!(err, BridgeError::InvalidPayload { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reregistering_replaces_request_handler() {
        let bridge = bridge(RuntimeMode::Packaged);
        bridge.register_request_handler::<Test, _>(|()| "first".to_string());
        bridge.register_request_handler::<Test, _>(|()| "second".to_string());

        let response = bridge
            .dispatch_request(message(Some(trusted().as_str()), Value::Null))
            .unwrap();
        assert_eq!(response, Some(json!("second")));
    }

    #[test]
    fn notification_listeners_run_in_registration_order() {
        let bridge = bridge(RuntimeMode::Packaged);
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b"] {
            let seen = seen.clone();
            bridge.register_notification_handler::<Test, _>(move |payload| {
                seen.lock().push(format!("{}:{}", tag, payload));
            });
        }

        bridge
            .dispatch_notification(message(Some(trusted().as_str()), json!("hello")))
            .expect("trusted notification");
        assert_eq!(*seen.lock(), vec!["a:hello".to_string(), "b:hello".to_string()]);
    }

    #[test]
    fn notification_gating_matches_requests() {
        let bridge = bridge(RuntimeMode::Packaged);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        bridge.register_notification_handler::<Test, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bridge
            .dispatch_notification(message(None, json!("x")))
            .is_ok());
        assert!(bridge
            .dispatch_notification(message(Some(untrusted().as_str()), json!("x")))
            .unwrap_err()
            .is_security_violation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_listener_does_not_starve_later_ones() {
        struct Count;
        impl Channel for Count {
            const NAME: &'static str = "test";
            type Payload = u32;
        }

        let bridge = bridge(RuntimeMode::Packaged);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            bridge.register_notification_handler::<Count, _>(move |n| seen.lock().push(n));
        }
        {
            let seen = seen.clone();
            bridge.register_notification_handler::<Test, _>(move |s| seen.lock().push(s.len() as u32));
        }
        {
            let seen = seen.clone();
            bridge.register_notification_handler::<Count, _>(move |n| seen.lock().push(n * 10));
        }

        let err = bridge
            .dispatch_notification(message(Some(trusted().as_str()), json!(7)))
            .expect_err("string listener cannot take a number");
        assert!(matches!(err, BridgeError::InvalidPayload { .. }));
        assert_eq!(*seen.lock(), vec![7, 70], "listeners after the failing one still run");
    }

    #[test]
    fn notification_without_listeners_is_not_an_error() {
        let bridge = bridge(RuntimeMode::Packaged);
        assert!(bridge
            .dispatch_notification(message(Some(trusted().as_str()), json!("x")))
            .is_ok());
    }

    #[test]
    fn send_notification_delivers_on_channel_name() {
        let target = RecordingTarget::default();
        send_notification::<Test, _>(&target, &"ping".to_string()).expect("delivery");

        let delivered = target.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0], ("test".to_string(), json!("ping")));
    }
}
