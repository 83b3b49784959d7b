//! Release helpers shared by the lock-cycle operations.

use crate::broker::{BrokerMessage, LockedReceiver, MessageSink};
use crate::service_bus_manager::errors::{ServiceBusError, ServiceBusResult};

/// Abandons every message, carrying on past failures.
///
/// Each failure is logged. If any abandon failed, the returned error counts
/// them and carries the first broker error.
pub(crate) async fn abandon_all<R: LockedReceiver>(
    receiver: &mut R,
    messages: &[R::Message],
) -> ServiceBusResult<()> {
    let mut failed = 0usize;
    let mut first_error = None;

    for message in messages {
        if let Err(e) = receiver.abandon_message(message).await {
            log::warn!(
                "Failed to abandon message {} (sequence: {}): {}",
                message.message_id().unwrap_or_default(),
                message.sequence_number(),
                e
            );
            failed += 1;
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        None => {
            if !messages.is_empty() {
                log::debug!("Abandoned {} messages", messages.len());
            }
            Ok(())
        }
        Some(e) => Err(ServiceBusError::MessageAbandonFailed(format!(
            "{failed} of {} messages stay locked until their lease expires: {e}",
            messages.len()
        ))),
    }
}

/// Abandons every message when the operation's result is already decided.
///
/// Messages that cannot be abandoned stay locked until the broker's lease expires.
pub(crate) async fn release_best_effort<R: LockedReceiver>(receiver: &mut R, messages: &[R::Message]) {
    if let Err(e) = abandon_all(receiver, messages).await {
        log::warn!("{}", e);
    }
}

pub(crate) async fn close_receiver<R: LockedReceiver>(receiver: &mut R, entity: &str) {
    if let Err(e) = receiver.dispose().await {
        log::warn!("Failed to dispose receiver for {}: {}", entity, e);
    }
}

pub(crate) async fn close_sender<S: MessageSink>(sender: &mut S, entity: &str) {
    if let Err(e) = sender.dispose().await {
        log::warn!("Failed to dispose sender for {}: {}", entity, e);
    }
}
