//! Topic-based pub/sub router with per-instance serialized delivery.
//!
//! The bus maps a topic `(type, session)` to the set of subscribed agent
//! types and delivers published envelopes to one lazily-created instance per
//! `(agent type, session)` pair. Every instance runs as its own task with a
//! bounded queue: handler invocations for one instance are processed one at a
//! time in delivery order, while distinct instances run concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::handler::{AgentFactory, BoxedAgent, MessageContext};
use super::message::{AgentId, Envelope, GroupChatMessage, MessagePayload, TopicId};
use crate::error::{ConciergeError, Result};

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

struct Delivery {
    envelope: Envelope,
    cancellation: CancellationToken,
    reply: Option<oneshot::Sender<Result<GroupChatMessage>>>,
}

struct InstanceHandle {
    queue: mpsc::Sender<Delivery>,
}

struct BusInner {
    /// topic type -> subscribed agent types. Read-only after `build()`.
    subscriptions: HashMap<String, Vec<String>>,
    factories: HashMap<String, AgentFactory>,
    instances: DashMap<AgentId, InstanceHandle>,
    queue_capacity: usize,
}

/// Startup-time registration of subscriptions and agent factories.
///
/// The (topic type -> agent type) bindings are fixed before traffic starts;
/// the built [`MessageBus`] never mutates them.
pub struct BusBuilder {
    queue_capacity: usize,
    subscriptions: HashMap<String, Vec<String>>,
    factories: HashMap<String, AgentFactory>,
}

impl BusBuilder {
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            subscriptions: HashMap::new(),
            factories: HashMap::new(),
        }
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Register the factory that creates instances of `agent_type`.
    pub fn register<F>(mut self, agent_type: impl Into<String>, factory: F) -> Self
    where
        F: Fn(AgentId) -> BoxedAgent + Send + Sync + 'static,
    {
        self.factories.insert(agent_type.into(), Arc::new(factory));
        self
    }

    /// Bind a topic type to an agent type.
    pub fn subscribe(mut self, topic_type: impl Into<String>, agent_type: impl Into<String>) -> Self {
        let entry = self.subscriptions.entry(topic_type.into()).or_default();
        let agent_type = agent_type.into();
        if !entry.contains(&agent_type) {
            entry.push(agent_type);
        }
        self
    }

    pub fn build(self) -> MessageBus {
        MessageBus {
            inner: Arc::new(BusInner {
                subscriptions: self.subscriptions,
                factories: self.factories,
                instances: DashMap::new(),
                queue_capacity: self.queue_capacity,
            }),
        }
    }
}

impl Default for BusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

impl MessageBus {
    pub fn builder() -> BusBuilder {
        BusBuilder::new()
    }

    /// Deliver `payload` to every agent instance subscribed to `topic`,
    /// at most once each. Dispatch is asynchronous: handlers run after this
    /// call returns control to the scheduler.
    ///
    /// Publishing to a topic type with zero subscribers is not an error; the
    /// envelope is logged and dropped.
    pub async fn publish(&self, payload: MessagePayload, topic: TopicId) -> Result<()> {
        let envelope = Envelope::new(payload, topic.clone());
        let Some(agent_types) = self.inner.subscriptions.get(&topic.topic_type) else {
            debug!(
                topic = %topic,
                kind = envelope.payload.type_name(),
                "No subscribers for topic, envelope dropped"
            );
            return Ok(());
        };

        debug!(
            topic = %topic,
            kind = envelope.payload.type_name(),
            subscribers = agent_types.len(),
            "Publishing envelope"
        );

        for agent_type in agent_types {
            let id = AgentId::new(agent_type.clone(), topic.source.clone());
            let queue = self.ensure_instance(&id)?;
            let delivery = Delivery {
                envelope: envelope.clone(),
                cancellation: CancellationToken::new(),
                reply: None,
            };
            if queue.send(delivery).await.is_err() {
                warn!(agent = %id, "Instance queue closed, envelope dropped");
            }
        }
        Ok(())
    }

    /// Issue a directed request to one agent instance and await its typed
    /// reply, bounded by `timeout`.
    ///
    /// On timeout the in-flight invocation's cancellation token is cancelled
    /// so the handler can abort any collaborator call it started.
    pub async fn request(
        &self,
        payload: MessagePayload,
        target: AgentId,
        timeout: Duration,
    ) -> Result<GroupChatMessage> {
        let topic = TopicId::new(target.agent_type.clone(), target.key.clone());
        let envelope = Envelope::new(payload, topic);
        let cancellation = CancellationToken::new();
        let (reply_tx, reply_rx) = oneshot::channel();

        let queue = self.ensure_instance(&target)?;
        let delivery = Delivery {
            envelope,
            cancellation: cancellation.clone(),
            reply: Some(reply_tx),
        };
        queue
            .send(delivery)
            .await
            .map_err(|_| ConciergeError::Routing(format!("instance {} is gone", target)))?;

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ConciergeError::Routing(format!(
                "instance {} dropped the request",
                target
            ))),
            Err(_) => {
                cancellation.cancel();
                Err(ConciergeError::Timeout(format!(
                    "directed request to {} exceeded {:?}",
                    target, timeout
                )))
            }
        }
    }

    /// Drop the instances belonging to `session`. In-flight handlers finish
    /// their current invocation; queued envelopes are discarded.
    pub fn retire_session(&self, session: &str) {
        self.inner.instances.retain(|id, _| id.key != session);
    }

    pub fn instance_count(&self) -> usize {
        self.inner.instances.len()
    }

    fn ensure_instance(&self, id: &AgentId) -> Result<mpsc::Sender<Delivery>> {
        match self.inner.instances.entry(id.clone()) {
            Entry::Occupied(occupied) => Ok(occupied.get().queue.clone()),
            Entry::Vacant(vacant) => {
                let factory = self.inner.factories.get(&id.agent_type).ok_or_else(|| {
                    ConciergeError::Routing(format!(
                        "no factory registered for agent type {}",
                        id.agent_type
                    ))
                })?;
                let agent = factory(id.clone());
                let (tx, rx) = mpsc::channel(self.inner.queue_capacity);
                spawn_instance(self.clone(), agent, id.clone(), rx);
                vacant.insert(InstanceHandle { queue: tx.clone() });
                debug!(agent = %id, "Created agent instance");
                Ok(tx)
            }
        }
    }
}

fn spawn_instance(
    bus: MessageBus,
    agent: BoxedAgent,
    id: AgentId,
    mut rx: mpsc::Receiver<Delivery>,
) {
    tokio::spawn(async move {
        while let Some(delivery) = rx.recv().await {
            let kind = delivery.envelope.kind();
            if !agent.should_handle(kind) {
                debug!(agent = %id, kind = ?kind, "No handler for kind, envelope ignored");
                if let Some(reply) = delivery.reply {
                    // A directed request must fail fast rather than hang the
                    // requester's barrier.
                    let _ = reply.send(Err(ConciergeError::Routing(format!(
                        "agent {} declares no handler for {:?}",
                        id, kind
                    ))));
                }
                continue;
            }

            if delivery.cancellation.is_cancelled() {
                if let Some(reply) = delivery.reply {
                    let _ = reply.send(Err(ConciergeError::Cancelled(format!(
                        "invocation for {} cancelled before dispatch",
                        id
                    ))));
                }
                continue;
            }

            let session = delivery.envelope.session().to_string();
            let ctx = MessageContext::new(
                delivery.envelope.topic.clone(),
                delivery.cancellation.clone(),
                bus.clone(),
            );
            let result = agent.handle(delivery.envelope.payload, &ctx).await;

            match (result, delivery.reply) {
                (Ok(Some(message)), Some(reply)) => {
                    let _ = reply.send(Ok(message));
                }
                (Ok(None), Some(reply)) => {
                    let _ = reply.send(Err(ConciergeError::Routing(format!(
                        "agent {} returned no reply for a directed request",
                        id
                    ))));
                }
                (Ok(Some(message)), None) => {
                    // Replies to broadcast requests feed the coordinator's
                    // per-session accumulator.
                    let topic = TopicId::group_chat(&session);
                    if let Err(e) = bus
                        .publish(MessagePayload::GroupChatMessage(message), topic)
                        .await
                    {
                        warn!(agent = %id, error = %e, "Failed to forward handler reply");
                    }
                }
                (Ok(None), None) => {}
                (Err(e), Some(reply)) => {
                    warn!(agent = %id, error = %e, "Handler failed for directed request");
                    let _ = reply.send(Err(e));
                }
                (Err(e), None) => {
                    // The bus does not retry; failures the handler chose not
                    // to convert are logged and dropped.
                    warn!(agent = %id, error = %e, "Handler failed, envelope dropped");
                }
            }
        }
        debug!(agent = %id, "Agent instance retired");
    });
}
