//! WebSocket message types and channel names.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

/// Outbound frame `type` values and inbound heartbeat types.
pub mod frame_types {
    /// Subscribe to a channel.
    pub const SUBSCRIBE: &str = "subscribe";
    /// Unsubscribe from a channel.
    pub const UNSUBSCRIBE: &str = "unsubscribe";
    /// Heartbeat request.
    pub const PING: &str = "ping";
    /// Heartbeat reply.
    pub const PONG: &str = "pong";
}

/// Channel identifiers.
///
/// A channel is a topic name optionally followed by dotted parameters, e.g.
/// `ticker.10000001` or `kline.LAST_PRICE.10000001.MINUTE_1`.
pub mod channels {
    /// Ticker topic.
    pub const TICKER: &str = "ticker";
    /// K-line topic.
    pub const KLINE: &str = "kline";
    /// Order book depth topic.
    pub const DEPTH: &str = "depth";
    /// Public trades topic.
    pub const TRADE: &str = "trade";
    /// Account updates (private).
    pub const ACCOUNT: &str = "account";
    /// Position updates (private).
    pub const POSITION: &str = "position";
    /// Order updates (private).
    pub const ORDER: &str = "order";

    /// `ticker.<contract_id>`
    pub fn ticker(contract_id: &str) -> String {
        format!("{TICKER}.{contract_id}")
    }

    /// `kline.LAST_PRICE.<contract_id>.<interval>`
    pub fn kline(contract_id: &str, interval: &str) -> String {
        format!("{KLINE}.LAST_PRICE.{contract_id}.{interval}")
    }

    /// `depth.<contract_id>`
    pub fn depth(contract_id: &str) -> String {
        format!("{DEPTH}.{contract_id}")
    }

    /// `trade.<contract_id>`
    pub fn trade(contract_id: &str) -> String {
        format!("{TRADE}.{contract_id}")
    }

    /// Topic of a channel: the text before the first `.`.
    pub fn topic(channel: &str) -> &str {
        channel.split('.').next().unwrap_or(channel)
    }
}

/// Subscription request.
///
/// Extra parameters are written next to `type` and `channel`. Those two keys
/// are reserved: a parameter with either name is not sent.
#[derive(Debug, Clone)]
pub struct SubscribeRequest<'a> {
    /// Always `subscribe`.
    pub kind: &'static str,
    /// Channel to subscribe to.
    pub channel: &'a str,
    /// Extra subscribe parameters.
    pub params: &'a Map<String, Value>,
}

impl Serialize for SubscribeRequest<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = self
            .params
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()));
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind)?;
        map.serialize_entry("channel", self.channel)?;
        for (key, value) in extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

const RESERVED_KEYS: [&str; 2] = ["type", "channel"];

impl<'a> SubscribeRequest<'a> {
    /// Create a subscribe frame.
    pub fn new(channel: &'a str, params: &'a Map<String, Value>) -> Self {
        Self {
            kind: frame_types::SUBSCRIBE,
            channel,
            params,
        }
    }
}

/// Unsubscription request.
#[derive(Debug, Clone, Serialize)]
pub struct UnsubscribeRequest<'a> {
    /// Always `unsubscribe`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Channel to unsubscribe from.
    pub channel: &'a str,
}

impl<'a> UnsubscribeRequest<'a> {
    /// Create an unsubscribe frame.
    pub fn new(channel: &'a str) -> Self {
        Self {
            kind: frame_types::UNSUBSCRIBE,
            channel,
        }
    }
}

/// Client heartbeat: `{"type":"ping"}`.
#[derive(Debug, Clone, Serialize)]
pub struct PingRequest {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl Default for PingRequest {
    fn default() -> Self {
        Self {
            kind: frame_types::PING,
        }
    }
}

/// Reply to a server ping, echoing its `time` when present.
#[derive(Debug, Clone, Serialize)]
pub struct PongReply {
    #[serde(rename = "type")]
    kind: &'static str,
    /// Time field copied from the server ping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,
}

impl PongReply {
    /// Build the reply to a server ping.
    pub fn to_ping(ping: &Value) -> Self {
        Self {
            kind: frame_types::PONG,
            time: ping.get("time").cloned(),
        }
    }
}

/// A parsed inbound frame.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// The frame text exactly as received.
    pub raw: String,
    /// The frame parsed as JSON.
    pub value: Value,
}

impl InboundMessage {
    /// Parse a text frame.
    pub fn parse(raw: impl Into<String>) -> Result<Self, serde_json::Error> {
        let raw = raw.into();
        let value = serde_json::from_str(&raw)?;
        Ok(Self { raw, value })
    }

    /// The message `type` field.
    pub fn message_type(&self) -> Option<&str> {
        self.value.get("type").and_then(Value::as_str)
    }

    /// The message `channel` field.
    pub fn channel(&self) -> Option<&str> {
        self.value.get("channel").and_then(Value::as_str)
    }

    /// Topic of the message channel.
    pub fn topic(&self) -> Option<&str> {
        self.channel().map(channels::topic)
    }

    /// Check if this is a heartbeat reply.
    pub fn is_pong(&self) -> bool {
        self.message_type() == Some(frame_types::PONG)
    }

    /// Check if this is a server heartbeat request.
    pub fn is_ping(&self) -> bool {
        self.message_type() == Some(frame_types::PING)
    }
}
