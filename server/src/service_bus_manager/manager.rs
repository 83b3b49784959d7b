use super::command_handlers::*;
use super::commands::ServiceBusCommand;
use super::errors::{ServiceBusError, ServiceBusResult};
use super::responses::ServiceBusResponse;
use crate::broker::BrokerConnection;
use crate::lock_cycle::LockCycleConfig;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Dispatches [`ServiceBusCommand`]s to the lock-cycle operations.
///
/// The manager holds no receivers or senders between commands: every command
/// opens its own through the injected connection and disposes them before the
/// response is returned. Commands issued concurrently are independent; the
/// broker's message locks are the only coordination between them.
///
/// # Examples
///
/// ```no_run
/// use server::connection::{AzureConnection, ConnectionDescriptor};
/// use server::lock_cycle::LockCycleConfig;
/// use server::service_bus_manager::{EntityRef, ServiceBusCommand, ServiceBusManager};
///
/// async fn example(connection_string: &str) -> Result<(), Box<dyn std::error::Error>> {
///     let descriptor = ConnectionDescriptor::parse(connection_string)?;
///     let connection = AzureConnection::connect(descriptor).await?;
///     let manager = ServiceBusManager::new(connection, LockCycleConfig::default());
///
///     let response = manager
///         .execute_command(ServiceBusCommand::PurgeMessages {
///             entity: EntityRef::queue("orders").dead_letter(),
///         })
///         .await;
///     println!("{response:?}");
///     Ok(())
/// }
/// ```
pub struct ServiceBusManager<C> {
    message_handler: MessageCommandHandler<C>,
    bulk_handler: BulkCommandHandler<C>,
    connection: Arc<C>,

    // Error tracking
    last_error: Arc<Mutex<Option<String>>>,
}

impl<C: BrokerConnection> ServiceBusManager<C> {
    pub fn new(connection: C, config: LockCycleConfig) -> Self {
        let connection = Arc::new(connection);
        let config = Arc::new(config);

        Self {
            message_handler: MessageCommandHandler::new(connection.clone(), config.clone()),
            bulk_handler: BulkCommandHandler::new(connection.clone(), config),
            connection,
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Disposes the shared connection.
    ///
    /// Fails with [`ServiceBusError::ConnectionFailed`] while a command is
    /// still holding the connection.
    pub async fn close(self) -> ServiceBusResult<()> {
        let Self {
            message_handler,
            bulk_handler,
            connection,
            ..
        } = self;
        drop(message_handler);
        drop(bulk_handler);

        let connection = Arc::try_unwrap(connection).map_err(|_| {
            ServiceBusError::ConnectionFailed("connection still in use".to_string())
        })?;
        connection.close().await
    }

    /// Executes a command and returns its response.
    ///
    /// Errors are converted into [`ServiceBusResponse::Error`] and remembered
    /// as the last error; a successful or not-found command clears it.
    pub async fn execute_command(&self, command: ServiceBusCommand) -> ServiceBusResponse {
        log::debug!("Executing command: {command:?}");
        let name = command.name();

        let result = self.handle_command(command).await;

        match result {
            Ok(response) => {
                let mut last_error = self.last_error.lock().await;
                *last_error = None;
                response
            }
            Err(error) => {
                let mut last_error = self.last_error.lock().await;
                *last_error = Some(error.to_string());
                if error.is_partial_failure() {
                    log::warn!("Command {name} partially failed: {error}");
                } else {
                    log::error!("Command {name} failed: {error}");
                }
                ServiceBusResponse::Error { error }
            }
        }
    }

    pub async fn get_last_error(&self) -> Option<String> {
        let last_error = self.last_error.lock().await;
        last_error.clone()
    }

    async fn handle_command(
        &self,
        command: ServiceBusCommand,
    ) -> ServiceBusResult<ServiceBusResponse> {
        match command {
            ServiceBusCommand::PeekMessages {
                entity,
                max_count,
                from_sequence,
            } => {
                self.message_handler
                    .handle_peek_messages(entity, max_count, from_sequence)
                    .await
            }
            ServiceBusCommand::DeleteMessage { entity, message_id } => {
                self.message_handler
                    .handle_delete_message(entity, message_id)
                    .await
            }
            ServiceBusCommand::DeadLetterMessage {
                entity,
                message_id,
                reason,
                error_description,
            } => {
                self.message_handler
                    .handle_dead_letter_message(entity, message_id, reason, error_description)
                    .await
            }
            ServiceBusCommand::ResubmitDeadLetter { entity, sequence } => {
                self.message_handler
                    .handle_resubmit_dead_letter(entity, sequence)
                    .await
            }
            ServiceBusCommand::MoveMessage {
                source,
                message_id,
                destination,
            } => {
                self.message_handler
                    .handle_move_message(source, message_id, destination)
                    .await
            }
            ServiceBusCommand::SendMessage {
                entity_name,
                message,
            } => {
                self.message_handler
                    .handle_send_message(entity_name, message)
                    .await
            }

            // Bulk drain commands
            ServiceBusCommand::PurgeMessages { entity } => {
                self.bulk_handler.handle_purge(entity).await
            }
            ServiceBusCommand::TransferDeadLetters { entity } => {
                self.bulk_handler.handle_transfer_dead_letters(entity).await
            }
        }
    }
}
