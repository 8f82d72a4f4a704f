//! Bridge between the message bus and the command dispatcher.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::bus::events::{InboundMessage, OutboundMessage};
use crate::commands::{Dispatcher, Route};

/// Connects the bus to the command dispatcher.
///
/// Each inbound message is handled on its own task, so a slow upstream
/// only delays the command that triggered it. Replies go back through the
/// bus to the transport the message came from.
pub struct CommandBridge {
    outbound: mpsc::Sender<OutboundMessage>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
}

impl CommandBridge {
    pub fn new(
        outbound: mpsc::Sender<OutboundMessage>,
        dispatcher: Arc<Dispatcher>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            outbound,
            dispatcher,
            cancel,
        }
    }

    /// Run until cancelled or until every inbound sender is gone.
    pub async fn run(self, mut inbound_rx: mpsc::Receiver<InboundMessage>) -> Result<()> {
        info!("Command bridge started");

        loop {
            let msg = tokio::select! {
                _ = self.cancel.cancelled() => break,
                msg = inbound_rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            debug!(channel = msg.channel, chat_id = msg.chat_id, "Bridge received message");

            let dispatcher = Arc::clone(&self.dispatcher);
            let outbound = self.outbound.clone();
            tokio::spawn(async move {
                handle_message(&dispatcher, &outbound, msg).await;
            });
        }

        info!("Command bridge shutting down");
        Ok(())
    }
}

/// Dispatch one message and publish whatever it produces.
pub async fn handle_message(
    dispatcher: &Dispatcher,
    outbound: &mpsc::Sender<OutboundMessage>,
    msg: InboundMessage,
) {
    let reply = match dispatcher.route(&msg.content) {
        Route::Command(matched) => {
            if let Err(e) = outbound.send(OutboundMessage::typing_for(&msg)).await {
                debug!(chat_id = msg.chat_id, "Failed to queue typing indicator: {}", e);
            }
            matched.run().await
        }
        Route::Unknown(Some(reply)) => reply.to_owned(),
        Route::Unknown(None) => return,
    };

    if let Err(e) = outbound.send(OutboundMessage::reply_to(&msg, reply)).await {
        error!(chat_id = msg.chat_id, "Failed to queue reply: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::StaticReplyHandler;
    use crate::commands::{Command, CommandRegistry, UnknownCommandPolicy};

    fn dispatcher() -> Arc<Dispatcher> {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                Command::exact("/ping"),
                Arc::new(StaticReplyHandler::new("ping", "pong")),
            )
            .unwrap();
        Arc::new(Dispatcher::new(registry, UnknownCommandPolicy::Silent))
    }

    #[tokio::test]
    async fn test_reply_goes_back_to_origin() {
        let (tx, mut rx) = mpsc::channel(8);
        let inbound = InboundMessage {
            channel: "telegram".into(),
            chat_id: "55".into(),
            thread_id: Some(3),
            user_id: "1".into(),
            content: "/ping".into(),
        };

        handle_message(&dispatcher(), &tx, inbound).await;

        assert!(matches!(rx.recv().await, Some(OutboundMessage::Typing { .. })));
        match rx.recv().await {
            Some(OutboundMessage::Reply {
                chat_id,
                thread_id,
                content,
                ..
            }) => {
                assert_eq!(chat_id, "55");
                assert_eq!(thread_id, Some(3));
                assert_eq!(content, "pong");
            }
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unmatched_message_sends_nothing() {
        let (tx, mut rx) = mpsc::channel(8);
        handle_message(&dispatcher(), &tx, InboundMessage::cli("just chatting")).await;
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_reply_skips_typing() {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                Command::exact("/ping"),
                Arc::new(StaticReplyHandler::new("ping", "pong")),
            )
            .unwrap();
        let dispatcher = Dispatcher::new(registry, UnknownCommandPolicy::Reply("Huh?".into()));
        let (tx, mut rx) = mpsc::channel(8);

        handle_message(&dispatcher, &tx, InboundMessage::cli("/pong")).await;
        drop(tx);

        match rx.recv().await {
            Some(OutboundMessage::Reply { content, .. }) => assert_eq!(content, "Huh?"),
            other => panic!("expected reply, got {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_outbound_does_not_panic() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        handle_message(&dispatcher(), &tx, InboundMessage::cli("/ping")).await;
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let (in_tx, in_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let bridge = CommandBridge::new(out_tx, dispatcher(), cancel.clone());
        let handle = tokio::spawn(bridge.run(in_rx));

        in_tx.send(InboundMessage::cli("/ping")).await.unwrap();
        assert!(matches!(out_rx.recv().await, Some(OutboundMessage::Typing { .. })));
        assert!(matches!(out_rx.recv().await, Some(OutboundMessage::Reply { .. })));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }
}
