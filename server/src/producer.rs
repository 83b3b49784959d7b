use crate::broker::MessageSink;
use crate::model::OutboundMessage;
use crate::service_bus_manager::errors::{ServiceBusError, ServiceBusResult};
use async_trait::async_trait;
use azservicebus::{ServiceBusMessage, ServiceBusSender};
use fe2o3_amqp_types::messaging::ApplicationProperties;

/// A wrapper around an Azure Service Bus sender for one queue or topic.
///
/// # Examples
///
/// ```no_run
/// use server::broker::MessageSink;
/// use server::model::OutboundMessage;
/// use server::producer::Producer;
/// use azservicebus::ServiceBusSender;
///
/// async fn example(sender: ServiceBusSender) -> Result<(), Box<dyn std::error::Error>> {
///     let mut producer = Producer::new(sender);
///     producer
///         .send_messages(vec![OutboundMessage::text("Hello, world!")])
///         .await?;
///     producer.dispose().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Producer {
    sender: Option<ServiceBusSender>,
}

impl Producer {
    pub fn new(sender: ServiceBusSender) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Builds the wire message for an outbound clone or composed message.
    pub fn create_message(outbound: OutboundMessage) -> ServiceBusMessage {
        let OutboundMessage {
            content,
            message_id,
            content_type,
            label,
            correlation_id,
            time_to_live,
            custom_properties,
        } = outbound;

        let mut message = ServiceBusMessage::new(content);

        if let Some(id) = message_id {
            if let Err(e) = message.set_message_id(&id) {
                log::warn!("Failed to set message ID {}: {}", id, e);
            }
        }
        if let Some(content_type) = content_type {
            message.set_content_type(content_type);
        }
        if let Some(subject) = label {
            message.set_subject(subject);
        }
        if let Some(correlation_id) = correlation_id {
            message.set_correlation_id(correlation_id);
        }
        if let Some(ttl) = time_to_live {
            message.set_time_to_live(ttl);
        }

        if !custom_properties.is_empty() {
            let properties = message
                .application_properties_mut()
                .get_or_insert_with(ApplicationProperties::default);
            for property in custom_properties {
                properties.insert(property.key, property.value);
            }
        }

        message
    }
}

#[async_trait]
impl MessageSink for Producer {
    async fn send_messages(&mut self, messages: Vec<OutboundMessage>) -> ServiceBusResult<()> {
        let sender = self
            .sender
            .as_mut()
            .ok_or(ServiceBusError::ResourceDisposed("Sender"))?;
        let messages: Vec<ServiceBusMessage> =
            messages.into_iter().map(Producer::create_message).collect();
        sender
            .send_messages(messages)
            .await
            .map_err(|e| ServiceBusError::MessageSendFailed(e.to_string()))
    }

    async fn dispose(&mut self) -> ServiceBusResult<()> {
        let sender = self
            .sender
            .take()
            .ok_or(ServiceBusError::ResourceDisposed("Sender"))?;
        sender
            .dispose()
            .await
            .map_err(|e| ServiceBusError::ConnectionFailed(format!("Sender dispose failed: {e}")))
    }
}
