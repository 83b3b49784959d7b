use super::types::EntityRef;
use crate::model::OutboundMessage;

/// Commands for Service Bus operations using the command pattern.
///
/// Each command carries everything its operation needs, including the entity
/// it targets. Commands are executed by [`ServiceBusManager`], which opens
/// fresh receivers and senders for every command.
///
/// [`ServiceBusManager`]: super::ServiceBusManager
///
/// # Examples
///
/// ```no_run
/// use server::service_bus_manager::{EntityRef, ServiceBusCommand};
///
/// // Delete a poison message from a queue's dead-letter sub-queue
/// let command = ServiceBusCommand::DeleteMessage {
///     entity: EntityRef::queue("orders").dead_letter(),
///     message_id: "order-17".to_string(),
/// };
///
/// // Return every dead-lettered message of a subscription to its topic
/// let command = ServiceBusCommand::TransferDeadLetters {
///     entity: EntityRef::subscription("events", "audit"),
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceBusCommand {
    /// List messages without locking them.
    PeekMessages {
        entity: EntityRef,
        /// Defaults to the configured peek count
        max_count: Option<u32>,
        from_sequence: Option<i64>,
    },

    /// Remove one message, located by id.
    DeleteMessage {
        entity: EntityRef,
        message_id: String,
    },

    /// Move one message of a main backlog to its dead-letter sub-queue.
    DeadLetterMessage {
        entity: EntityRef,
        message_id: String,
        reason: Option<String>,
        error_description: Option<String>,
    },

    /// Send a dead-lettered message, located by sequence number, back to the
    /// main backlog and remove the original.
    ResubmitDeadLetter {
        /// The queue or subscription; its dead-letter sub-queue is read
        entity: EntityRef,
        sequence: i64,
    },

    /// Drain a backlog without inspecting its messages.
    PurgeMessages { entity: EntityRef },

    /// Move every dead-lettered message back to the main backlog.
    TransferDeadLetters {
        /// The queue or subscription; its dead-letter sub-queue is drained
        entity: EntityRef,
    },

    /// Relocate one message, located by id, to another queue or topic.
    MoveMessage {
        source: EntityRef,
        message_id: String,
        destination: String,
    },

    /// Send a composed message to a queue or topic.
    SendMessage {
        entity_name: String,
        message: OutboundMessage,
    },
}

impl ServiceBusCommand {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceBusCommand::PeekMessages { .. } => "peek",
            ServiceBusCommand::DeleteMessage { .. } => "delete",
            ServiceBusCommand::DeadLetterMessage { .. } => "dead-letter",
            ServiceBusCommand::ResubmitDeadLetter { .. } => "resubmit",
            ServiceBusCommand::PurgeMessages { .. } => "purge",
            ServiceBusCommand::TransferDeadLetters { .. } => "transfer",
            ServiceBusCommand::MoveMessage { .. } => "move",
            ServiceBusCommand::SendMessage { .. } => "send",
        }
    }
}
