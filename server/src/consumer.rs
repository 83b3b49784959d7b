use crate::broker::{BrokerMessage, LockedReceiver};
use crate::model::{CustomProperty, Message};
use crate::service_bus_manager::errors::{ServiceBusError, ServiceBusResult};
use async_trait::async_trait;
use azservicebus::receiver::DeadLetterOptions;
use azservicebus::{ServiceBusPeekedMessage, ServiceBusReceivedMessage, ServiceBusReceiver};
use std::borrow::Cow;
use std::time::Duration;

/// A wrapper around an Azure Service Bus receiver bound to one backlog.
///
/// The receiver can be disposed once; every later call fails with
/// [`ServiceBusError::ResourceDisposed`].
#[derive(Debug)]
pub struct Consumer {
    receiver: Option<ServiceBusReceiver>,
    is_dlq: bool,
}

impl Consumer {
    pub fn new(receiver: ServiceBusReceiver, is_dlq: bool) -> Self {
        Self {
            receiver: Some(receiver),
            is_dlq,
        }
    }

    fn receiver(&mut self) -> ServiceBusResult<&mut ServiceBusReceiver> {
        self.receiver
            .as_mut()
            .ok_or(ServiceBusError::ResourceDisposed("Receiver"))
    }
}

#[async_trait]
impl LockedReceiver for Consumer {
    type Message = ServiceBusReceivedMessage;

    async fn receive_messages(
        &mut self,
        max_count: u32,
        timeout: Duration,
    ) -> ServiceBusResult<Vec<ServiceBusReceivedMessage>> {
        let receiver = self.receiver()?;
        match tokio::time::timeout(timeout, receiver.receive_messages(max_count)).await {
            Ok(result) => result.map_err(|e| ServiceBusError::MessageReceiveFailed(e.to_string())),
            Err(_) => {
                // Timeout occurred - return empty vector instead of error
                log::debug!(
                    "receive_messages timed out after {:?}, returning empty result",
                    timeout
                );
                Ok(Vec::new())
            }
        }
    }

    async fn peek_messages(
        &mut self,
        max_count: u32,
        from_sequence_number: Option<i64>,
    ) -> ServiceBusResult<Vec<Message>> {
        let is_dlq = self.is_dlq;
        let messages = self
            .receiver()?
            .peek_messages(max_count, from_sequence_number)
            .await
            .map_err(|e| ServiceBusError::MessagePeekFailed(e.to_string()))?;
        Ok(messages.iter().map(|m| m.snapshot(is_dlq)).collect())
    }

    async fn complete_message(&mut self, message: &ServiceBusReceivedMessage) -> ServiceBusResult<()> {
        self.receiver()?
            .complete_message(message)
            .await
            .map_err(|e| ServiceBusError::MessageCompleteFailed(e.to_string()))
    }

    async fn abandon_message(&mut self, message: &ServiceBusReceivedMessage) -> ServiceBusResult<()> {
        self.receiver()?
            .abandon_message(message, None)
            .await
            .map_err(|e| ServiceBusError::MessageAbandonFailed(e.to_string()))
    }

    async fn dead_letter_message(
        &mut self,
        message: &ServiceBusReceivedMessage,
        reason: Option<String>,
        error_description: Option<String>,
    ) -> ServiceBusResult<()> {
        let options = DeadLetterOptions {
            dead_letter_reason: reason,
            dead_letter_error_description: error_description,
            properties_to_modify: None,
        };
        self.receiver()?
            .dead_letter_message(message, options)
            .await
            .map_err(|e| ServiceBusError::MessageDeadLetterFailed(e.to_string()))
    }

    async fn dispose(&mut self) -> ServiceBusResult<()> {
        let receiver = self
            .receiver
            .take()
            .ok_or(ServiceBusError::ResourceDisposed("Receiver"))?;
        receiver
            .dispose()
            .await
            .map_err(|e| ServiceBusError::ConnectionFailed(format!("Receiver dispose failed: {e}")))
    }
}

/// Both message types expose the same read accessors; the snapshot is built
/// identically from either.
macro_rules! impl_broker_message {
    ($message:ty) => {
        impl BrokerMessage for $message {
            fn message_id(&self) -> Option<Cow<'_, str>> {
                <$message>::message_id(self).map(|id| Cow::Owned(id.to_string()))
            }

            fn sequence_number(&self) -> i64 {
                <$message>::sequence_number(self)
            }

            fn snapshot(&self, is_dlq: bool) -> Message {
                let custom_properties = self
                    .application_properties()
                    .map(|props| {
                        props
                            .0
                            .iter()
                            .map(|(key, value)| CustomProperty::new(key.clone(), value.clone()))
                            .collect()
                    })
                    .unwrap_or_default();

                Message {
                    id: BrokerMessage::message_id(self)
                        .map(Cow::into_owned)
                        .unwrap_or_default(),
                    sequence: <$message>::sequence_number(self),
                    content: self.body().map(|b| b.to_vec()).unwrap_or_default(),
                    content_type: self.content_type().map(|s| s.to_string()),
                    label: self.subject().map(|s| s.to_string()),
                    correlation_id: self.correlation_id().map(|s| s.to_string()),
                    delivery_count: self.delivery_count().unwrap_or(0),
                    time_to_live: self.time_to_live(),
                    enqueued_at: self.enqueued_time(),
                    dead_letter_reason: if is_dlq {
                        self.dead_letter_reason().map(|s| s.to_string())
                    } else {
                        None
                    },
                    custom_properties,
                    is_dlq,
                }
            }
        }
    };
}

impl_broker_message!(ServiceBusReceivedMessage);
impl_broker_message!(ServiceBusPeekedMessage);
