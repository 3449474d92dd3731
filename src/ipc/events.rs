//! Channel table shared by both ends of the bridge.
//!
//! Each channel is a zero-sized type naming the channel and the payload that
//! travels on it. Handlers are registered against these types, so a handler
//! with the wrong payload type does not compile.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A named channel and the payload carried on it.
pub trait Channel {
    const NAME: &'static str;
    type Payload: Serialize + DeserializeOwned + Send + 'static;
}

/// A channel that also answers requests. The handler receives `Args` from the
/// page and responds with the channel's payload.
pub trait RequestChannel: Channel {
    type Args: DeserializeOwned + Send + 'static;
}

/// Smoke-test channel. Requests take no arguments and answer with a string.
pub struct Test;

impl Channel for Test {
    const NAME: &'static str = "test";
    type Payload = String;
}

impl RequestChannel for Test {
    type Args = ();
}

/// Every channel name declared above, exposed to the page so the bridge
/// script can refuse unknown names before they reach the process.
pub const CHANNELS: &[&str] = &[Test::NAME];

pub fn is_known_channel(name: &str) -> bool {
    CHANNELS.contains(&name)
}
