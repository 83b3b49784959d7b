use super::errors::ServiceBusResult;
use super::responses::ServiceBusResponse;
use super::types::EntityRef;
use crate::broker::BrokerConnection;
use crate::lock_cycle::{self, LockCycleConfig, ResubmitOutcome, SearchOutcome};
use crate::model::OutboundMessage;
use std::sync::Arc;

fn not_found(entity: &EntityRef, target: impl Into<String>) -> ServiceBusResponse {
    ServiceBusResponse::NotFound {
        entity: entity.clone(),
        target: target.into(),
    }
}

/// Handles single-message commands
pub struct MessageCommandHandler<C> {
    connection: Arc<C>,
    config: Arc<LockCycleConfig>,
}

impl<C: BrokerConnection> MessageCommandHandler<C> {
    pub fn new(connection: Arc<C>, config: Arc<LockCycleConfig>) -> Self {
        Self { connection, config }
    }

    pub async fn handle_peek_messages(
        &self,
        entity: EntityRef,
        max_count: Option<u32>,
        from_sequence: Option<i64>,
    ) -> ServiceBusResult<ServiceBusResponse> {
        let count = max_count.unwrap_or_else(|| self.config.peek_count());
        let messages =
            lock_cycle::peek_messages(self.connection.as_ref(), &entity, count, from_sequence)
                .await?;
        Ok(ServiceBusResponse::MessagesPeeked { messages })
    }

    pub async fn handle_delete_message(
        &self,
        entity: EntityRef,
        message_id: String,
    ) -> ServiceBusResult<ServiceBusResponse> {
        let outcome =
            lock_cycle::delete_message(self.connection.as_ref(), &entity, &message_id, &self.config)
                .await?;
        Ok(match outcome {
            SearchOutcome::Found(message) => ServiceBusResponse::MessageDeleted { message },
            SearchOutcome::NotFound => not_found(&entity, message_id),
        })
    }

    pub async fn handle_dead_letter_message(
        &self,
        entity: EntityRef,
        message_id: String,
        reason: Option<String>,
        error_description: Option<String>,
    ) -> ServiceBusResult<ServiceBusResponse> {
        let outcome = lock_cycle::dead_letter_message(
            self.connection.as_ref(),
            &entity,
            &message_id,
            reason,
            error_description,
            &self.config,
        )
        .await?;
        Ok(match outcome {
            SearchOutcome::Found(message) => ServiceBusResponse::MessageDeadLettered { message },
            SearchOutcome::NotFound => not_found(&entity, message_id),
        })
    }

    pub async fn handle_resubmit_dead_letter(
        &self,
        entity: EntityRef,
        sequence: i64,
    ) -> ServiceBusResult<ServiceBusResponse> {
        let outcome =
            lock_cycle::resubmit_dead_letter(self.connection.as_ref(), &entity, sequence, &self.config)
                .await?;
        Ok(match outcome {
            ResubmitOutcome::Resubmitted(message) => ServiceBusResponse::MessageResubmitted {
                message,
                original_removed: true,
            },
            ResubmitOutcome::OriginalNotRemoved(message) => {
                ServiceBusResponse::MessageResubmitted {
                    message,
                    original_removed: false,
                }
            }
            ResubmitOutcome::NotFound => {
                not_found(&entity.dead_letter(), format!("sequence {sequence}"))
            }
        })
    }

    pub async fn handle_move_message(
        &self,
        source: EntityRef,
        message_id: String,
        destination: String,
    ) -> ServiceBusResult<ServiceBusResponse> {
        let outcome = lock_cycle::move_message(
            self.connection.as_ref(),
            &source,
            &message_id,
            &destination,
            &self.config,
        )
        .await?;
        Ok(match outcome {
            SearchOutcome::Found(message) => ServiceBusResponse::MessageMoved {
                message,
                destination,
            },
            SearchOutcome::NotFound => not_found(&source, message_id),
        })
    }

    pub async fn handle_send_message(
        &self,
        entity_name: String,
        message: OutboundMessage,
    ) -> ServiceBusResult<ServiceBusResponse> {
        lock_cycle::send_message(self.connection.as_ref(), &entity_name, message).await?;
        Ok(ServiceBusResponse::MessageSent { entity_name })
    }
}

/// Handles commands that drain a whole backlog
pub struct BulkCommandHandler<C> {
    connection: Arc<C>,
    config: Arc<LockCycleConfig>,
}

impl<C: BrokerConnection> BulkCommandHandler<C> {
    pub fn new(connection: Arc<C>, config: Arc<LockCycleConfig>) -> Self {
        Self { connection, config }
    }

    pub async fn handle_purge(&self, entity: EntityRef) -> ServiceBusResult<ServiceBusResponse> {
        let count = lock_cycle::purge(self.connection.as_ref(), &entity, &self.config).await?;
        Ok(ServiceBusResponse::MessagesPurged { count })
    }

    pub async fn handle_transfer_dead_letters(
        &self,
        entity: EntityRef,
    ) -> ServiceBusResult<ServiceBusResponse> {
        let count =
            lock_cycle::transfer_dead_letters(self.connection.as_ref(), &entity, &self.config)
                .await?;
        Ok(ServiceBusResponse::DeadLettersTransferred { count })
    }
}
