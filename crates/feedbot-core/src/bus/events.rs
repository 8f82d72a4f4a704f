//! Message bus event types.
//!
//! Defines the messages that flow between chat transports and the bridge.

/// A text message received by a transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Source channel identifier (e.g., "telegram", "cli").
    pub channel: String,
    /// Chat/conversation identifier within the channel.
    pub chat_id: String,
    /// Forum topic the message was posted in, if any.
    pub thread_id: Option<i32>,
    /// User identifier.
    pub user_id: String,
    /// Message text content.
    pub content: String,
}

/// A message the bridge asks a transport to deliver.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Text reply, sent to the chat and thread the command came from.
    Reply {
        channel: String,
        chat_id: String,
        thread_id: Option<i32>,
        content: String,
    },
    /// Show a "typing…" indicator while a handler runs (best-effort).
    Typing {
        channel: String,
        chat_id: String,
        thread_id: Option<i32>,
    },
}

impl OutboundMessage {
    /// A reply addressed to wherever `inbound` came from.
    pub fn reply_to(inbound: &InboundMessage, content: impl Into<String>) -> Self {
        Self::Reply {
            channel: inbound.channel.clone(),
            chat_id: inbound.chat_id.clone(),
            thread_id: inbound.thread_id,
            content: content.into(),
        }
    }

    /// A typing indicator for wherever `inbound` came from.
    pub fn typing_for(inbound: &InboundMessage) -> Self {
        Self::Typing {
            channel: inbound.channel.clone(),
            chat_id: inbound.chat_id.clone(),
            thread_id: inbound.thread_id,
        }
    }

    pub fn channel(&self) -> &str {
        match self {
            Self::Reply { channel, .. } | Self::Typing { channel, .. } => channel,
        }
    }

    pub fn chat_id(&self) -> &str {
        match self {
            Self::Reply { chat_id, .. } | Self::Typing { chat_id, .. } => chat_id,
        }
    }

    pub fn thread_id(&self) -> Option<i32> {
        match self {
            Self::Reply { thread_id, .. } | Self::Typing { thread_id, .. } => *thread_id,
        }
    }
}

impl InboundMessage {
    /// Create a message as if typed on the local command line.
    pub fn cli(content: &str) -> Self {
        Self {
            channel: "cli".into(),
            chat_id: "direct".into(),
            thread_id: None,
            user_id: "user".into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_keeps_thread() {
        let inbound = InboundMessage {
            channel: "telegram".into(),
            chat_id: "-100123".into(),
            thread_id: Some(42),
            user_id: "7".into(),
            content: "/lc".into(),
        };
        let msg = OutboundMessage::reply_to(&inbound, "hi");
        assert_eq!(msg.channel(), "telegram");
        assert_eq!(msg.chat_id(), "-100123");
        assert_eq!(msg.thread_id(), Some(42));
        assert!(matches!(msg, OutboundMessage::Reply { ref content, .. } if content == "hi"));
    }

    #[test]
    fn test_typing_variant() {
        let msg = OutboundMessage::typing_for(&InboundMessage::cli("/lc"));
        assert_eq!(msg.channel(), "cli");
        assert_eq!(msg.thread_id(), None);
        assert!(matches!(msg, OutboundMessage::Typing { .. }));
    }
}
