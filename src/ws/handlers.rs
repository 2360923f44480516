//! Message handlers and lifecycle hooks for [`ChannelSession`].
//!
//! Handlers are keyed by message type and at most one runs per frame; a later
//! registration for the same key replaces the earlier one. Hooks are ordered
//! observers: every registered hook runs, in registration order.
//!
//! All callbacks run on the session's event loop task and must not block.
//!
//! [`ChannelSession`]: crate::ws::ChannelSession

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EdgexError;
use crate::ws::messages::InboundMessage;

/// Callback for messages of one type or topic.
pub type MessageHandler = Arc<dyn Fn(&InboundMessage) + Send + Sync>;
/// Observer called after every successful open.
pub type OpenHook = Arc<dyn Fn() + Send + Sync>;
/// Observer called with every parsed application frame.
pub type RawMessageHook = Arc<dyn Fn(&InboundMessage) + Send + Sync>;
/// Observer called when the transport goes away.
pub type DisconnectHook = Arc<dyn Fn(&EdgexError) + Send + Sync>;

/// Handler registry plus hook lists for one session.
#[derive(Default, Clone)]
pub(crate) struct Callbacks {
    handlers: HashMap<String, MessageHandler>,
    open_hooks: Vec<OpenHook>,
    message_hooks: Vec<RawMessageHook>,
    disconnect_hooks: Vec<DisconnectHook>,
}

impl Callbacks {
    /// Register `handler` for `key`, replacing any existing one.
    pub fn set_handler(&mut self, key: impl Into<String>, handler: MessageHandler) {
        let key = key.into();
        if self.handlers.insert(key.clone(), handler).is_some() {
            tracing::debug!(key = %key, "replaced message handler");
        }
    }

    /// Drop the handler for `key`.
    pub fn remove_handler(&mut self, key: &str) -> bool {
        self.handlers.remove(key).is_some()
    }

    pub fn push_open_hook(&mut self, hook: OpenHook) {
        self.open_hooks.push(hook);
    }

    pub fn push_message_hook(&mut self, hook: RawMessageHook) {
        self.message_hooks.push(hook);
    }

    pub fn push_disconnect_hook(&mut self, hook: DisconnectHook) {
        self.disconnect_hooks.push(hook);
    }

    pub fn open_hooks(&self) -> Vec<OpenHook> {
        self.open_hooks.clone()
    }

    pub fn disconnect_hooks(&self) -> Vec<DisconnectHook> {
        self.disconnect_hooks.clone()
    }

    /// Hooks and the single handler that should see `message`.
    ///
    /// The handler keyed by the message `type` wins; otherwise the handler
    /// keyed by the channel topic is used.
    pub fn route(&self, message: &InboundMessage) -> (Vec<RawMessageHook>, Option<MessageHandler>) {
        let handler = message
            .message_type()
            .and_then(|kind| self.handlers.get(kind))
            .or_else(|| message.topic().and_then(|topic| self.handlers.get(topic)))
            .cloned();
        (self.message_hooks.clone(), handler)
    }
}
