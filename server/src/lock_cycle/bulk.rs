//! Bulk drain operations. Both receive in [`ReceiveMode::ReceiveAndDelete`],
//! so no message content is inspected and nothing is left locked.

use super::session::{close_receiver, close_sender};
use super::types::LockCycleConfig;
use crate::broker::{BrokerConnection, BrokerMessage, LockedReceiver, MessageSink, ReceiveMode};
use crate::model::OutboundMessage;
use crate::service_bus_manager::errors::{ServiceBusError, ServiceBusResult};
use crate::service_bus_manager::types::EntityRef;

/// Drains the addressed backlog and returns how many messages were removed.
///
/// Stops at the first receive that comes back empty within the bulk timeout,
/// so a backlog of `n` messages takes `n / batch size` receives, rounded up,
/// plus the final empty one.
pub async fn purge<C: BrokerConnection>(
    connection: &C,
    entity: &EntityRef,
    config: &LockCycleConfig,
) -> ServiceBusResult<u64> {
    entity.validate()?;
    log::info!("Purging {}", entity);

    let mut receiver = connection
        .open_receiver(entity, ReceiveMode::ReceiveAndDelete)
        .await?;
    let result = drain(&mut receiver, config).await;
    close_receiver(&mut receiver, &entity.path()).await;

    match &result {
        Ok(count) => log::info!("Purged {} messages from {}", count, entity),
        Err(e) => log::error!("Purge of {} failed: {}", entity, e),
    }
    result
}

async fn drain<R: LockedReceiver>(receiver: &mut R, config: &LockCycleConfig) -> ServiceBusResult<u64> {
    let mut total = 0u64;
    loop {
        let batch = receiver
            .receive_messages(config.fetch_batch_size(), config.bulk_receive_timeout())
            .await?;
        if batch.is_empty() {
            return Ok(total);
        }
        total += batch.len() as u64;
        log::debug!("Removed batch of {} messages, {} so far", batch.len(), total);
    }
}

/// Moves every message of the entity's dead-letter sub-queue back to its main
/// backlog and returns how many were transferred.
///
/// Each batch is removed from the dead-letter sub-queue when it is received and
/// re-sent before the next receive. A failed send loses that batch; the error
/// reports how many messages were transferred before it and how many were lost.
pub async fn transfer_dead_letters<C: BrokerConnection>(
    connection: &C,
    entity: &EntityRef,
    config: &LockCycleConfig,
) -> ServiceBusResult<u64> {
    let dlq = entity.dead_letter();
    dlq.validate()?;
    let target = dlq.send_target();

    log::info!("Transferring dead-lettered messages from {} to {}", dlq, target);

    let mut sender = connection.open_sender(target).await?;
    let mut receiver = match connection
        .open_receiver(&dlq, ReceiveMode::ReceiveAndDelete)
        .await
    {
        Ok(receiver) => receiver,
        Err(e) => {
            close_sender(&mut sender, target).await;
            return Err(e);
        }
    };

    let result = relay(&mut receiver, &mut sender, config).await;
    close_receiver(&mut receiver, &dlq.path()).await;
    close_sender(&mut sender, target).await;

    match &result {
        Ok(count) => log::info!("Transferred {} messages from {} to {}", count, dlq, target),
        Err(e) => log::error!("Transfer from {} failed: {}", dlq, e),
    }
    result
}

async fn relay<R, S>(
    receiver: &mut R,
    sender: &mut S,
    config: &LockCycleConfig,
) -> ServiceBusResult<u64>
where
    R: LockedReceiver,
    S: MessageSink,
{
    let mut transferred = 0u64;
    loop {
        let batch = receiver
            .receive_messages(config.fetch_batch_size(), config.bulk_receive_timeout())
            .await?;
        if batch.is_empty() {
            return Ok(transferred);
        }

        let clones: Vec<OutboundMessage> = batch
            .iter()
            .map(|m| OutboundMessage::from(&m.snapshot(true)))
            .collect();
        let count = clones.len();

        if let Err(e) = sender.send_messages(clones).await {
            log::error!(
                "Send failed after {} transferred messages, {} received messages are lost",
                transferred,
                count
            );
            return Err(ServiceBusError::TransferInterrupted {
                transferred,
                lost: count,
                source: Box::new(e),
            });
        }

        transferred += count as u64;
        log::debug!("Transferred batch of {} messages, {} so far", count, transferred);
    }
}
