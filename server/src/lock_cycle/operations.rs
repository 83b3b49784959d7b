//! Single-message operations built on the search primitive.
//!
//! Each operation opens its own receivers and senders through the supplied
//! [`BrokerConnection`] and disposes them on every exit path. Dispose failures
//! are logged and never replace the operation's own result.

use super::search::{DeadLetter, Relocate, Resolution, Settle, id_matches, search_and_resolve};
use super::session::{close_receiver, close_sender};
use super::types::{LockCycleConfig, ResubmitOutcome, SearchOutcome};
use crate::broker::{BrokerConnection, LockedReceiver, MessageSink, ReceiveMode};
use crate::model::{Message, OutboundMessage};
use crate::service_bus_manager::errors::{ServiceBusError, ServiceBusResult};
use crate::service_bus_manager::types::{EntityRef, validate_name};

/// Removes the message with `message_id` from the addressed backlog.
pub async fn delete_message<C: BrokerConnection>(
    connection: &C,
    entity: &EntityRef,
    message_id: &str,
    config: &LockCycleConfig,
) -> ServiceBusResult<SearchOutcome> {
    log::info!("Deleting message {} from {}", message_id, entity);
    search_entity(connection, entity, message_id, &mut Settle, config).await
}

/// Moves the message with `message_id` from a main backlog to its dead-letter sub-queue.
///
/// Dead-letter sub-queues are rejected before anything is received.
pub async fn dead_letter_message<C: BrokerConnection>(
    connection: &C,
    entity: &EntityRef,
    message_id: &str,
    reason: Option<String>,
    description: Option<String>,
    config: &LockCycleConfig,
) -> ServiceBusResult<SearchOutcome> {
    if entity.is_dlq() {
        return Err(ServiceBusError::ConfigurationError(format!(
            "Cannot dead-letter message {message_id}: {entity} is already a dead-letter sub-queue"
        )));
    }

    log::info!("Dead-lettering message {} in {}", message_id, entity);
    let mut resolution = DeadLetter {
        reason,
        description,
    };
    search_entity(connection, entity, message_id, &mut resolution, config).await
}

/// Sends a clone of the dead-lettered message at `sequence` back to the main
/// backlog, then deletes the original from the dead-letter sub-queue.
///
/// The three steps are not atomic. If the delete step fails, the clone stays
/// in the main backlog and the original stays in the dead-letter sub-queue;
/// the error reports the completed send. Retrying only the delete is safe,
/// retrying the whole resubmit is not.
pub async fn resubmit_dead_letter<C: BrokerConnection>(
    connection: &C,
    entity: &EntityRef,
    sequence: i64,
    config: &LockCycleConfig,
) -> ServiceBusResult<ResubmitOutcome> {
    let dlq = entity.dead_letter();
    dlq.validate()?;

    log::info!("Resubmitting message at sequence {} from {}", sequence, dlq);

    let Some(original) = peek_at(connection, &dlq, sequence).await? else {
        log::info!("No message at sequence {} in {}", sequence, dlq);
        return Ok(ResubmitOutcome::NotFound);
    };

    let target = dlq.send_target();
    send_to(connection, target, vec![OutboundMessage::from(&original)]).await?;
    log::debug!("Clone of message {} sent to {}", original.id, target);

    match search_entity(connection, &dlq, &original.id, &mut Settle, config).await {
        Ok(SearchOutcome::Found(_)) => {
            log::info!("Message {} resubmitted to {}", original.id, target);
            Ok(ResubmitOutcome::Resubmitted(original))
        }
        Ok(SearchOutcome::NotFound) => {
            log::warn!(
                "Message {} was sent to {} but could no longer be found in {}",
                original.id,
                target,
                dlq
            );
            Ok(ResubmitOutcome::OriginalNotRemoved(original))
        }
        Err(e) => {
            log::warn!(
                "Message {} was sent to {} but the original is still in {}: {}",
                original.id,
                target,
                dlq,
                e
            );
            Err(e.after(
                "resubmit",
                format!("clone of message {} sent to {}", original.id, target),
            ))
        }
    }
}

/// Relocates the message with `message_id` from `source` to the queue or topic
/// named `destination`: a clone is sent to the destination, then the original
/// is settled.
///
/// Non-matching messages are released as in [`search_and_resolve`]. If the
/// clone is sent but the original cannot be settled, the error is a partial
/// failure and the message exists at both ends.
pub async fn move_message<C: BrokerConnection>(
    connection: &C,
    source: &EntityRef,
    message_id: &str,
    destination: &str,
    config: &LockCycleConfig,
) -> ServiceBusResult<SearchOutcome> {
    source.validate()?;
    validate_name("destination", destination)?;

    log::info!(
        "Moving message {} from {} to {}",
        message_id,
        source,
        destination
    );

    let mut sender = connection.open_sender(destination).await?;
    let result = {
        let mut resolution = Relocate {
            sender: &mut sender,
            destination: destination.to_string(),
        };
        search_entity(connection, source, message_id, &mut resolution, config).await
    };
    close_sender(&mut sender, destination).await;
    result
}

/// Lists up to `count` messages without locking them.
pub async fn peek_messages<C: BrokerConnection>(
    connection: &C,
    entity: &EntityRef,
    count: u32,
    from_sequence: Option<i64>,
) -> ServiceBusResult<Vec<Message>> {
    entity.validate()?;

    let mut receiver = connection
        .open_receiver(entity, ReceiveMode::PeekLock)
        .await?;
    let result = receiver.peek_messages(count, from_sequence).await;
    close_receiver(&mut receiver, &entity.path()).await;

    let messages = result?;
    log::debug!("Peeked {} messages from {}", messages.len(), entity);
    Ok(messages)
}

/// Sends one message to a queue or topic.
pub async fn send_message<C: BrokerConnection>(
    connection: &C,
    entity_name: &str,
    message: OutboundMessage,
) -> ServiceBusResult<()> {
    validate_name("entity name", entity_name)?;
    send_to(connection, entity_name, vec![message]).await?;
    log::info!("Sent message to {}", entity_name);
    Ok(())
}

/// Runs one search against `entity` on a receiver opened for this call only.
async fn search_entity<C, X>(
    connection: &C,
    entity: &EntityRef,
    message_id: &str,
    resolution: &mut X,
    config: &LockCycleConfig,
) -> ServiceBusResult<SearchOutcome>
where
    C: BrokerConnection,
    X: Resolution,
{
    entity.validate()?;

    let mut receiver = connection
        .open_receiver(entity, ReceiveMode::PeekLock)
        .await?;
    let result = search_and_resolve(
        &mut receiver,
        id_matches(message_id),
        resolution,
        config,
        entity.is_dlq(),
    )
    .await;
    close_receiver(&mut receiver, &entity.path()).await;

    match &result {
        Ok(SearchOutcome::Found(_)) => {
            log::info!("{} of message {} in {} done", resolution.name(), message_id, entity)
        }
        Ok(SearchOutcome::NotFound) => {
            log::info!("Message {} not found in {}", message_id, entity)
        }
        Err(e) => log::error!(
            "{} of message {} in {} failed: {}",
            resolution.name(),
            message_id,
            entity,
            e
        ),
    }
    result
}

/// Non-destructive lookup of the message at exactly `sequence`.
async fn peek_at<C: BrokerConnection>(
    connection: &C,
    entity: &EntityRef,
    sequence: i64,
) -> ServiceBusResult<Option<Message>> {
    let mut receiver = connection
        .open_receiver(entity, ReceiveMode::PeekLock)
        .await?;
    let result = receiver.peek_messages(1, Some(sequence)).await;
    close_receiver(&mut receiver, &entity.path()).await;

    Ok(result?.into_iter().find(|m| m.sequence == sequence))
}

async fn send_to<C: BrokerConnection>(
    connection: &C,
    entity_name: &str,
    messages: Vec<OutboundMessage>,
) -> ServiceBusResult<()> {
    let mut sender = connection.open_sender(entity_name).await?;
    let result = sender.send_messages(messages).await;
    close_sender(&mut sender, entity_name).await;
    result
}
