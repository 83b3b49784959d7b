//! The lock-cycle search primitive and the resolutions it can apply.

use super::session::{abandon_all, release_best_effort};
use super::types::{AbandonPolicy, LockCycleConfig, SearchOutcome};
use crate::broker::{BrokerMessage, LockedReceiver, MessageSink};
use crate::model::OutboundMessage;
use crate::service_bus_manager::errors::{ServiceBusError, ServiceBusResult};
use async_trait::async_trait;
use std::collections::HashSet;

/// Terminal action applied to the one message a search is looking for.
#[async_trait]
pub trait Resolution: Send {
    /// Name used in logs and partial-failure reports.
    fn name(&self) -> &'static str;

    async fn resolve<R: LockedReceiver>(
        &mut self,
        receiver: &mut R,
        message: &R::Message,
    ) -> ServiceBusResult<()>;
}

/// Removes the message from its backlog.
#[derive(Debug, Default)]
pub struct Settle;

#[async_trait]
impl Resolution for Settle {
    fn name(&self) -> &'static str {
        "delete"
    }

    async fn resolve<R: LockedReceiver>(
        &mut self,
        receiver: &mut R,
        message: &R::Message,
    ) -> ServiceBusResult<()> {
        receiver.complete_message(message).await
    }
}

/// Moves the message to its entity's dead-letter sub-queue.
#[derive(Debug, Default)]
pub struct DeadLetter {
    pub reason: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
impl Resolution for DeadLetter {
    fn name(&self) -> &'static str {
        "dead-letter"
    }

    async fn resolve<R: LockedReceiver>(
        &mut self,
        receiver: &mut R,
        message: &R::Message,
    ) -> ServiceBusResult<()> {
        receiver
            .dead_letter_message(message, self.reason.clone(), self.description.clone())
            .await
    }
}

/// Sends a clone through `sender`, then settles the original.
///
/// When the clone is sent but the original cannot be settled, the message
/// exists at both ends and the failure is reported as partial.
pub struct Relocate<'a, S> {
    pub sender: &'a mut S,
    pub destination: String,
}

#[async_trait]
impl<S: MessageSink> Resolution for Relocate<'_, S> {
    fn name(&self) -> &'static str {
        "move"
    }

    async fn resolve<R: LockedReceiver>(
        &mut self,
        receiver: &mut R,
        message: &R::Message,
    ) -> ServiceBusResult<()> {
        let clone = OutboundMessage::from(&message.snapshot(false));
        self.sender.send_messages(vec![clone]).await?;
        receiver
            .complete_message(message)
            .await
            .map_err(|e| e.after("move", format!("clone sent to {}", self.destination)))
    }
}

/// Predicate matching messages by exact id.
pub fn id_matches<M: BrokerMessage>(target: &str) -> impl Fn(&M) -> bool + Sync {
    move |message: &M| message.message_id().is_some_and(|id| id == target)
}

/// Searches the receiver's backlog for the first message satisfying `is_target`
/// and applies `resolution` to it.
///
/// Every other message received during the search is abandoned, per batch or
/// at the end depending on the configured [`AbandonPolicy`]. The broker hands
/// abandoned messages straight back, so under [`AbandonPolicy::PerBatch`] the
/// first batch containing an already examined message switches the search to
/// holding examined messages until it ends; later receives then reach deeper
/// into the backlog.
///
/// The search ends as not found when a receive comes back empty. A batch made
/// only of messages this search still holds means their locks lapsed before
/// the target was reached; the search then fails with
/// [`ServiceBusError::SearchStalled`] rather than claiming the target is
/// absent. There is no iteration limit; the per-receive timeout bounds each
/// wait.
///
/// Abandon failures once the outcome is decided are logged and leave the
/// outcome alone; those messages stay locked until their lease expires.
///
/// [`ServiceBusError::SearchStalled`]: crate::service_bus_manager::ServiceBusError::SearchStalled
pub async fn search_and_resolve<R, P, X>(
    receiver: &mut R,
    is_target: P,
    resolution: &mut X,
    config: &LockCycleConfig,
    is_dlq: bool,
) -> ServiceBusResult<SearchOutcome>
where
    R: LockedReceiver,
    P: Fn(&R::Message) -> bool + Sync,
    X: Resolution,
{
    let mut retained = Vec::new();
    let result = scan(receiver, &is_target, resolution, config, is_dlq, &mut retained).await;
    release_best_effort(receiver, &retained).await;
    result
}

async fn scan<R, P, X>(
    receiver: &mut R,
    is_target: &P,
    resolution: &mut X,
    config: &LockCycleConfig,
    is_dlq: bool,
    retained: &mut Vec<R::Message>,
) -> ServiceBusResult<SearchOutcome>
where
    R: LockedReceiver,
    P: Fn(&R::Message) -> bool + Sync,
    X: Resolution,
{
    let mut holding = config.abandon_policy() == AbandonPolicy::Deferred;
    let mut seen = HashSet::new();
    let mut examined = 0usize;

    loop {
        let mut batch = receiver
            .receive_messages(config.fetch_batch_size(), config.search_receive_timeout())
            .await?;

        if batch.is_empty() {
            log::debug!(
                "Backlog exhausted after examining {} messages, target not found",
                examined
            );
            return Ok(SearchOutcome::NotFound);
        }

        examined += batch.len();
        let revisits = batch
            .iter()
            .filter(|m| seen.contains(&m.sequence_number()))
            .count();
        seen.extend(batch.iter().map(|m| m.sequence_number()));

        if let Some(index) = batch.iter().position(is_target) {
            let target = batch.remove(index);
            let snapshot = target.snapshot(is_dlq);
            retained.append(&mut batch);

            log::debug!(
                "Found message {} (sequence: {}) after examining {} messages",
                snapshot.id,
                snapshot.sequence,
                examined
            );

            if let Err(e) = resolution.resolve(receiver, &target).await {
                log::error!(
                    "Failed to {} message {}: {}",
                    resolution.name(),
                    snapshot.id,
                    e
                );
                retained.push(target);
                return Err(e);
            }
            return Ok(SearchOutcome::Found(snapshot));
        }

        if holding && revisits == batch.len() {
            retained.append(&mut batch);
            log::warn!(
                "Broker redelivered messages this search still holds, stopping after {} messages",
                examined
            );
            return Err(ServiceBusError::SearchStalled { examined });
        }

        if !holding && revisits > 0 {
            log::info!(
                "Broker redelivered {} abandoned messages, holding examined messages until the search ends",
                revisits
            );
            holding = true;
        }

        if holding {
            retained.append(&mut batch);
        } else {
            abandon_all(receiver, &batch).await?;
        }
    }
}
