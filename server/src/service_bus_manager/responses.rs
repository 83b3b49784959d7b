use super::errors::ServiceBusError;
use super::types::EntityRef;
use crate::model::Message;

/// Response types for Service Bus operations.
///
/// A message that could not be located is reported as [`NotFound`], distinct
/// from [`Error`], so callers can treat it as a normal negative result.
///
/// [`NotFound`]: ServiceBusResponse::NotFound
/// [`Error`]: ServiceBusResponse::Error
///
/// # Examples
///
/// ```no_run
/// use server::service_bus_manager::ServiceBusResponse;
///
/// fn report(response: ServiceBusResponse) {
///     match response {
///         ServiceBusResponse::MessageDeleted { message } => println!("Deleted {}", message.id),
///         ServiceBusResponse::NotFound { entity, target } => {
///             println!("{target} not found in {entity}")
///         }
///         ServiceBusResponse::Error { error } => eprintln!("Operation failed: {error}"),
///         _ => println!("Operation completed successfully"),
///     }
/// }
/// ```
#[derive(Debug)]
pub enum ServiceBusResponse {
    MessagesPeeked {
        messages: Vec<Message>,
    },

    /// The message as it was when it was removed.
    MessageDeleted {
        message: Message,
    },

    MessageDeadLettered {
        message: Message,
    },

    /// A clone of `message` was sent to the main backlog.
    MessageResubmitted {
        message: Message,
        /// False when the original had already left the dead-letter sub-queue
        original_removed: bool,
    },

    MessagesPurged {
        count: u64,
    },

    DeadLettersTransferred {
        count: u64,
    },

    MessageMoved {
        message: Message,
        destination: String,
    },

    MessageSent {
        entity_name: String,
    },

    /// The targeted message id or sequence number is not in the backlog.
    NotFound {
        entity: EntityRef,
        target: String,
    },

    Error {
        error: ServiceBusError,
    },
}

impl ServiceBusResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, ServiceBusResponse::Error { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceBusResponse::NotFound { .. })
    }
}
