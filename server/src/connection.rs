//! Connection descriptor parsing and the Azure Service Bus [`BrokerConnection`].

use crate::broker::{BrokerConnection, ReceiveMode};
use crate::consumer::Consumer;
use crate::producer::Producer;
use crate::service_bus_manager::errors::{ServiceBusError, ServiceBusResult};
use crate::service_bus_manager::types::EntityRef;
use async_trait::async_trait;
use azservicebus::core::BasicRetryPolicy;
use azservicebus::{
    ServiceBusClient, ServiceBusClientOptions, ServiceBusReceiveMode, ServiceBusReceiverOptions,
    ServiceBusSenderOptions,
};
use std::fmt;
use tokio::sync::Mutex;

/// The validated parts of a shared-access connection string.
///
/// Parsing happens before any network call so malformed input is reported as
/// a configuration error.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    raw: String,
    endpoint: String,
    namespace: String,
    key_name: String,
}

impl ConnectionDescriptor {
    pub fn parse(connection_string: &str) -> ServiceBusResult<Self> {
        let raw = connection_string.trim();
        if raw.is_empty() {
            return Err(ServiceBusError::ConfigurationError(
                "Connection string cannot be empty".to_string(),
            ));
        }

        let mut endpoint = None;
        let mut key_name = None;
        let mut key = None;

        for part in raw.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some(value) = part.strip_prefix("Endpoint=") {
                endpoint = Some(value.to_string());
            } else if let Some(value) = part.strip_prefix("SharedAccessKeyName=") {
                key_name = Some(value.to_string());
            } else if let Some(value) = part.strip_prefix("SharedAccessKey=") {
                key = Some(value.to_string());
            }
        }

        let endpoint = endpoint.filter(|e| !e.is_empty()).ok_or_else(|| {
            ServiceBusError::ConfigurationError("Missing Endpoint in connection string".to_string())
        })?;
        let namespace = namespace_of(&endpoint).ok_or_else(|| {
            ServiceBusError::ConfigurationError(format!(
                "Endpoint '{endpoint}' does not name a namespace"
            ))
        })?;
        let key_name = key_name.filter(|k| !k.is_empty()).ok_or_else(|| {
            ServiceBusError::ConfigurationError(
                "Missing SharedAccessKeyName in connection string".to_string(),
            )
        })?;
        key.filter(|k| !k.is_empty()).ok_or_else(|| {
            ServiceBusError::ConfigurationError(
                "Missing SharedAccessKey in connection string".to_string(),
            )
        })?;

        Ok(Self {
            raw: raw.to_string(),
            endpoint,
            namespace,
            key_name,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn connection_string(&self) -> &str {
        &self.raw
    }
}

// The shared access key never reaches logs.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("endpoint", &self.endpoint)
            .field("key_name", &self.key_name)
            .finish_non_exhaustive()
    }
}

/// Extracts `namespace` from endpoints like `sb://namespace.servicebus.windows.net/`.
fn namespace_of(endpoint: &str) -> Option<String> {
    let host = &endpoint[endpoint.find("://")? + 3..];
    let namespace = &host[..host.find('.')?];
    (!namespace.is_empty()).then(|| namespace.to_string())
}

/// Azure Service Bus implementation of [`BrokerConnection`].
///
/// Dead-letter sub-queues are addressed by their broker path.
pub struct AzureConnection {
    client: Mutex<ServiceBusClient<BasicRetryPolicy>>,
    namespace: String,
}

impl AzureConnection {
    pub async fn connect(descriptor: ConnectionDescriptor) -> ServiceBusResult<Self> {
        log::info!("Connecting to Service Bus namespace {}", descriptor.namespace());
        let client = ServiceBusClient::new_from_connection_string(
            descriptor.connection_string(),
            ServiceBusClientOptions::default(),
        )
        .await
        .map_err(|e| {
            ServiceBusError::ConnectionFailed(format!(
                "Failed to create ServiceBus client for {}: {e}",
                descriptor.namespace()
            ))
        })?;

        Ok(Self {
            client: Mutex::new(client),
            namespace: descriptor.namespace().to_string(),
        })
    }
}

#[async_trait]
impl BrokerConnection for AzureConnection {
    type Receiver = Consumer;
    type Sender = Producer;

    async fn open_receiver(&self, entity: &EntityRef, mode: ReceiveMode) -> ServiceBusResult<Consumer> {
        let options = ServiceBusReceiverOptions {
            receive_mode: match mode {
                ReceiveMode::PeekLock => ServiceBusReceiveMode::PeekLock,
                ReceiveMode::ReceiveAndDelete => ServiceBusReceiveMode::ReceiveAndDelete,
            },
            ..Default::default()
        };

        log::debug!("Creating {:?} receiver for {}", mode, entity);
        let mut client = self.client.lock().await;
        let receiver = match entity.subscription_name() {
            Some(subscription) if !entity.is_dlq() => {
                client
                    .create_receiver_for_subscription(entity.entity_name(), subscription, options)
                    .await
            }
            _ => client.create_receiver_for_queue(entity.path(), options).await,
        }
        .map_err(|e| {
            ServiceBusError::ReceiverCreationFailed(format!(
                "Failed to create receiver for {entity}: {e}"
            ))
        })?;

        Ok(Consumer::new(receiver, entity.is_dlq()))
    }

    async fn open_sender(&self, entity_name: &str) -> ServiceBusResult<Producer> {
        log::debug!("Creating sender for {}", entity_name);
        let mut client = self.client.lock().await;
        let sender = client
            .create_sender(entity_name, ServiceBusSenderOptions::default())
            .await
            .map_err(|e| {
                ServiceBusError::SenderCreationFailed(format!(
                    "Failed to create sender for {entity_name}: {e}"
                ))
            })?;
        Ok(Producer::new(sender))
    }

    async fn close(self) -> ServiceBusResult<()> {
        log::debug!("Closing connection to {}", self.namespace);
        self.client
            .into_inner()
            .dispose()
            .await
            .map_err(|e| ServiceBusError::ConnectionFailed(format!("Client dispose failed: {e}")))
    }
}
