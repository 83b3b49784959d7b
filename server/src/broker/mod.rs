//! # Broker Capabilities
//!
//! Request-scoped handles the lock-cycle engine works against. Every operation
//! receives a [`BrokerConnection`], opens the receivers and senders it needs
//! and disposes them before returning, so no broker state is shared between
//! operations and every operation can be exercised against an in-memory fake.
//!
//! The Azure Service Bus implementation lives in [`crate::connection`],
//! [`crate::consumer`] and [`crate::producer`].

use crate::model::{Message, OutboundMessage};
use crate::service_bus_manager::errors::ServiceBusResult;
use crate::service_bus_manager::types::EntityRef;
use async_trait::async_trait;
use std::borrow::Cow;
use std::time::Duration;

/// How a receiver takes messages off its backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveMode {
    /// Messages are leased to the receiver and must be settled, dead-lettered or abandoned
    PeekLock,
    /// Messages are removed from the backlog as they are received
    ReceiveAndDelete,
}

/// A message held by a receiver.
///
/// Under [`ReceiveMode::PeekLock`] the value also carries the lock, so it has
/// to be handed back to the receiver that produced it to be resolved.
pub trait BrokerMessage: Send + Sync {
    fn message_id(&self) -> Option<Cow<'_, str>>;

    fn sequence_number(&self) -> i64;

    /// Builds the engine's snapshot of this message.
    ///
    /// Pure conversion: no broker calls, same output for the same input.
    fn snapshot(&self, is_dlq: bool) -> Message;
}

/// A receiver bound to exactly one backlog.
#[async_trait]
pub trait LockedReceiver: Send {
    type Message: BrokerMessage;

    /// Receives up to `max_count` messages.
    ///
    /// Hitting `timeout` yields an empty batch, not an error.
    async fn receive_messages(
        &mut self,
        max_count: u32,
        timeout: Duration,
    ) -> ServiceBusResult<Vec<Self::Message>>;

    /// Reads up to `max_count` messages without locking them.
    async fn peek_messages(
        &mut self,
        max_count: u32,
        from_sequence_number: Option<i64>,
    ) -> ServiceBusResult<Vec<Message>>;

    async fn complete_message(&mut self, message: &Self::Message) -> ServiceBusResult<()>;

    async fn abandon_message(&mut self, message: &Self::Message) -> ServiceBusResult<()>;

    async fn dead_letter_message(
        &mut self,
        message: &Self::Message,
        reason: Option<String>,
        error_description: Option<String>,
    ) -> ServiceBusResult<()>;

    /// Closes the receiver. Any later call fails with a disposed error.
    async fn dispose(&mut self) -> ServiceBusResult<()>;
}

/// A sender bound to one queue or topic.
#[async_trait]
pub trait MessageSink: Send {
    async fn send_messages(&mut self, messages: Vec<OutboundMessage>) -> ServiceBusResult<()>;

    /// Closes the sender. Any later call fails with a disposed error.
    async fn dispose(&mut self) -> ServiceBusResult<()>;
}

/// Opens receivers and senders against one namespace.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    type Receiver: LockedReceiver;
    type Sender: MessageSink;

    async fn open_receiver(
        &self,
        entity: &EntityRef,
        mode: ReceiveMode,
    ) -> ServiceBusResult<Self::Receiver>;

    async fn open_sender(&self, entity_name: &str) -> ServiceBusResult<Self::Sender>;

    /// Releases the namespace connection once no operation is using it.
    async fn close(self) -> ServiceBusResult<()>;
}
