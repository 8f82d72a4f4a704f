//! Telegram transport over teloxide long polling.

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, MessageId, ThreadId};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::bus::events::{InboundMessage, OutboundMessage};
use crate::bus::MessageBus;
use crate::gateway::utils::chunk_message;

/// Maximum Telegram message length, in characters.
const TELEGRAM_MAX_LEN: usize = 4096;

const CHANNEL: &str = "telegram";

/// Long-polling Telegram transport.
///
/// Text messages become [`InboundMessage`]s on the bus; replies published
/// for the `telegram` channel are sent back to the same chat and topic.
pub struct TelegramTransport {
    token: String,
    bus: Arc<MessageBus>,
    allow_from: Vec<String>,
}

impl TelegramTransport {
    pub fn new(token: String, bus: Arc<MessageBus>, allow_from: Vec<String>) -> Self {
        Self {
            token,
            bus,
            allow_from,
        }
    }

    pub async fn run(self) -> Result<()> {
        let bot = Bot::new(&self.token);

        info!("Telegram transport started");

        // A leftover webhook makes getUpdates fail with a conflict.
        if let Err(e) = bot.delete_webhook().drop_pending_updates(true).send().await {
            warn!("Failed to delete webhook: {}", e);
        }

        // Register delivery before polling so no reply can be dropped.
        {
            let bot_out = bot.clone();
            self.bus
                .subscribe_outbound(CHANNEL, move |msg| {
                    let bot_out = bot_out.clone();
                    async move { deliver(&bot_out, msg).await }
                })
                .await;
        }

        let inbound = self.bus.inbound_sender();
        let allow_from = self.allow_from;
        let handler = Update::filter_message().endpoint(
            |msg: Message, inbound: mpsc::Sender<InboundMessage>, allow_from: Vec<String>| async move {
                let user_id = msg
                    .from
                    .as_ref()
                    .map(|u| u.id.to_string())
                    .unwrap_or_else(|| "unknown".to_owned());

                if !allow_from.is_empty() && !allow_from.contains(&user_id) {
                    warn!(
                        user_id = %user_id,
                        chat_id = msg.chat.id.0,
                        "Rejected message from user not in allowFrom list"
                    );
                    return respond(());
                }

                if let Some(text) = msg.text() {
                    let inbound_msg = InboundMessage {
                        channel: CHANNEL.to_owned(),
                        chat_id: msg.chat.id.to_string(),
                        thread_id: msg.thread_id.map(|ThreadId(MessageId(id))| id),
                        user_id,
                        content: text.to_owned(),
                    };

                    if let Err(e) = inbound.send(inbound_msg).await {
                        error!("Failed to send inbound message to bus: {}", e);
                    }
                }
                respond(())
            },
        );

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![inbound, allow_from])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

async fn deliver(bot: &Bot, msg: OutboundMessage) {
    let Ok(chat_id) = msg.chat_id().parse::<i64>() else {
        debug!(chat_id = msg.chat_id(), "Ignoring outbound message for non-numeric chat");
        return;
    };
    let chat_id = ChatId(chat_id);
    let thread_id = msg.thread_id().map(|id| ThreadId(MessageId(id)));

    match msg {
        OutboundMessage::Reply { content, .. } => {
            for chunk in chunk_message(&content, TELEGRAM_MAX_LEN) {
                let mut send = bot.send_message(chat_id, chunk);
                if let Some(thread_id) = thread_id {
                    send = send.message_thread_id(thread_id);
                }
                if let Err(e) = send.await {
                    error!(chat_id = chat_id.0, "Failed to send Telegram message: {}", e);
                }
            }
        }
        OutboundMessage::Typing { .. } => {
            let mut action = bot.send_chat_action(chat_id, ChatAction::Typing);
            if let Some(thread_id) = thread_id {
                action = action.message_thread_id(thread_id);
            }
            if let Err(e) = action.await {
                debug!(chat_id = chat_id.0, "Failed to send typing indicator: {}", e);
            }
        }
    }
}
