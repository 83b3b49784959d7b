use thiserror::Error;

/// Failures surfaced by broker operations.
///
/// A message that could not be located is not an error; operations report it
/// through their outcome types. The variants fall into three groups:
///
/// - configuration errors, raised before any receive attempt
/// - transport errors, raised when the broker connection fails mid-operation
///   (messages locked at that moment stay locked until their lease expires)
/// - partial failures of composite operations, which report the step that
///   already took effect so callers can reason about duplicates or losses
///
/// [`ServiceBusError::SearchStalled`] is none of these: the broker answered,
/// but a search could not tell whether its target exists.
#[derive(Debug, Error)]
pub enum ServiceBusError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Invalid entity reference: {0}")]
    InvalidEntityReference(String),

    /// Connection related errors
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Receiver creation failed: {0}")]
    ReceiverCreationFailed(String),
    #[error("Sender creation failed: {0}")]
    SenderCreationFailed(String),
    #[error("{0} already disposed")]
    ResourceDisposed(&'static str),

    /// Message operation errors
    #[error("Message receive failed: {0}")]
    MessageReceiveFailed(String),
    #[error("Message peek failed: {0}")]
    MessagePeekFailed(String),
    #[error("Message send failed: {0}")]
    MessageSendFailed(String),
    #[error("Message complete failed: {0}")]
    MessageCompleteFailed(String),
    #[error("Message abandon failed: {0}")]
    MessageAbandonFailed(String),
    #[error("Message dead letter failed: {0}")]
    MessageDeadLetterFailed(String),

    /// Messages held by a search came back before the target was reached
    #[error(
        "Search stopped after examining {examined} messages: the broker redelivered messages whose locks expired before the target was reached. Raise the entity's lock duration or lower fetch_batch_size and retry"
    )]
    SearchStalled { examined: usize },

    /// A multi-step operation stopped after `completed` had already taken effect
    #[error("{operation} partially failed after {completed}: {source}")]
    PartialFailure {
        operation: &'static str,
        completed: String,
        #[source]
        source: Box<ServiceBusError>,
    },

    /// Transfer stopped; the batch being sent when it failed is not recoverable
    #[error(
        "Dead-letter transfer interrupted after {transferred} messages, {lost} received messages were not re-sent: {source}"
    )]
    TransferInterrupted {
        transferred: u64,
        lost: usize,
        #[source]
        source: Box<ServiceBusError>,
    },
}

impl ServiceBusError {
    /// Wraps `self` as the failure of a later step of a composite operation.
    pub fn after(self, operation: &'static str, completed: impl Into<String>) -> Self {
        Self::PartialFailure {
            operation,
            completed: completed.into(),
            source: Box::new(self),
        }
    }

    /// Whether the error came from the broker connection rather than from input.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::ConfigurationError(_)
            | Self::InvalidEntityReference(_)
            | Self::SearchStalled { .. } => false,
            Self::PartialFailure { source, .. } | Self::TransferInterrupted { source, .. } => {
                source.is_transport()
            }
            _ => true,
        }
    }

    pub fn is_partial_failure(&self) -> bool {
        matches!(
            self,
            Self::PartialFailure { .. } | Self::TransferInterrupted { .. }
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError(_) | Self::InvalidEntityReference(_)
        )
    }
}

impl From<azure_core::Error> for ServiceBusError {
    fn from(err: azure_core::Error) -> Self {
        ServiceBusError::ConnectionFailed(err.to_string())
    }
}

// Result type alias for convenience
pub type ServiceBusResult<T> = Result<T, ServiceBusError>;
