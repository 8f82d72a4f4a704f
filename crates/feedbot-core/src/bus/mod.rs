//! In-process message bus between chat transports and the command bridge.
//!
//! Transports push [`InboundMessage`]s; the bridge consumes them and
//! publishes [`OutboundMessage`]s, which [`dispatch_outbound`] hands to the
//! delivery callback registered for the message's channel. The outbound
//! side is the bot's reply sink.

pub mod events;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use events::{InboundMessage, OutboundMessage};
use futures::future::BoxFuture;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// Upper bound on a single delivery callback.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

type DeliveryCallback = Box<dyn Fn(OutboundMessage) -> BoxFuture<'static, ()> + Send + Sync>;

/// Delivery callbacks by channel name, shared with the dispatch task.
pub type SubscriberMap = Arc<RwLock<HashMap<String, Vec<DeliveryCallback>>>>;

pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    subscribers: SubscriberMap,
}

pub struct MessageBusReceivers {
    pub inbound_rx: mpsc::Receiver<InboundMessage>,
    pub outbound_rx: mpsc::Receiver<OutboundMessage>,
}

impl MessageBus {
    /// Create a bus whose two queues each hold `capacity` messages.
    pub fn new(capacity: usize) -> (Self, MessageBusReceivers) {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);

        (
            Self {
                inbound_tx,
                outbound_tx,
                subscribers: Arc::new(RwLock::new(HashMap::new())),
            },
            MessageBusReceivers {
                inbound_rx,
                outbound_rx,
            },
        )
    }

    pub fn inbound_sender(&self) -> mpsc::Sender<InboundMessage> {
        self.inbound_tx.clone()
    }

    pub fn outbound_sender(&self) -> mpsc::Sender<OutboundMessage> {
        self.outbound_tx.clone()
    }

    pub fn subscribers(&self) -> SubscriberMap {
        Arc::clone(&self.subscribers)
    }

    /// Register the delivery callback for `channel`.
    ///
    /// Safe to call after [`dispatch_outbound`] has started.
    pub async fn subscribe_outbound<F, Fut>(&self, channel: &str, callback: F)
    where
        F: Fn(OutboundMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: DeliveryCallback = Box::new(move |msg| Box::pin(callback(msg)));
        self.subscribers
            .write()
            .await
            .entry(channel.to_owned())
            .or_default()
            .push(boxed);
    }
}

/// Deliver outbound messages until every sender is dropped.
///
/// Run it as a background task; it only holds the subscriber map, never
/// the bus itself.
pub async fn dispatch_outbound(
    subscribers: SubscriberMap,
    mut outbound_rx: mpsc::Receiver<OutboundMessage>,
) {
    while let Some(msg) = outbound_rx.recv().await {
        let subs = subscribers.read().await;
        let Some(callbacks) = subs.get(msg.channel()) else {
            debug!(channel = msg.channel(), "No subscriber for outbound message");
            continue;
        };
        for callback in callbacks {
            if tokio::time::timeout(DELIVERY_TIMEOUT, callback(msg.clone()))
                .await
                .is_err()
            {
                warn!(
                    channel = msg.channel(),
                    chat_id = msg.chat_id(),
                    "Outbound delivery timed out"
                );
            }
        }
    }
    debug!("Outbound dispatch stopped (bus closed)");
}
