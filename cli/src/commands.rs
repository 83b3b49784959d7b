//! Command-line surface and dispatch.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::output::{self, Outcome, Rendered};
use crate::update_check;
use clap::{Args, Parser, Subcommand};
use server::connection::{AzureConnection, ConnectionDescriptor};
use server::model::OutboundMessage;
use server::service_bus_manager::{EntityRef, ServiceBusCommand, ServiceBusManager};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "busctl",
    version,
    about = "Inspect and repair Azure Service Bus queues, subscriptions and dead-letter queues"
)]
pub struct Cli {
    /// Path to a config.toml to use instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List messages without locking or removing them
    Peek {
        #[command(flatten)]
        entity: EntityArgs,
        /// Number of messages to list (defaults to peek_count)
        #[arg(long)]
        count: Option<u32>,
        /// First sequence number to list
        #[arg(long, value_name = "SEQUENCE")]
        from: Option<i64>,
    },
    /// Remove one message by id
    Delete {
        #[command(flatten)]
        entity: EntityArgs,
        message_id: String,
    },
    /// Move one message to the dead-letter queue
    DeadLetter {
        #[command(flatten)]
        entity: EntityArgs,
        message_id: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Send a dead-lettered message back to its main queue
    Resubmit {
        #[command(flatten)]
        entity: EntityArgs,
        /// Sequence number of the message in the dead-letter queue
        sequence: i64,
    },
    /// Remove every message from the queue
    Purge {
        #[command(flatten)]
        entity: EntityArgs,
    },
    /// Send every dead-lettered message back to the main queue
    Transfer {
        #[command(flatten)]
        entity: EntityArgs,
    },
    /// Copy one message to another queue or topic and remove the original
    Move {
        #[command(flatten)]
        entity: EntityArgs,
        message_id: String,
        /// Destination queue or topic
        #[arg(long = "to", value_name = "ENTITY")]
        destination: String,
    },
    /// Send a new message to a queue or topic
    Send {
        /// Destination queue or topic
        #[arg(long = "to", value_name = "ENTITY")]
        entity_name: String,
        /// Message body
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,
        /// Read the message body from a file
        #[arg(long, value_name = "PATH")]
        body_file: Option<PathBuf>,
        /// Message id (a random UUID when omitted)
        #[arg(long)]
        message_id: Option<String>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long)]
        correlation_id: Option<String>,
        /// Time to live in seconds
        #[arg(long, value_name = "SECS")]
        ttl: Option<u64>,
        /// Application property, repeatable
        #[arg(long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,
    },
    /// Check GitHub for a newer release
    CheckUpdate,
}

/// Addresses a queue, or a subscription of a topic, optionally its dead-letter queue.
#[derive(Debug, Args)]
pub struct EntityArgs {
    #[arg(long, conflicts_with_all = ["topic", "subscription"])]
    pub queue: Option<String>,
    #[arg(long, requires = "subscription")]
    pub topic: Option<String>,
    #[arg(long, requires = "topic")]
    pub subscription: Option<String>,
    /// Target the dead-letter queue
    #[arg(long)]
    pub dlq: bool,
}

impl EntityArgs {
    pub fn entity_ref(&self) -> AppResult<EntityRef> {
        let entity = match (&self.queue, &self.topic, &self.subscription) {
            (Some(queue), None, None) => EntityRef::queue(queue.as_str()),
            (None, Some(topic), Some(subscription)) => {
                EntityRef::subscription(topic.as_str(), subscription.as_str())
            }
            _ => {
                return Err(AppError::Usage(
                    "address an entity with --queue or with --topic and --subscription"
                        .to_string(),
                ));
            }
        };
        Ok(entity.with_dlq(self.dlq))
    }
}

impl Command {
    /// Builds the broker command, or `None` for commands that do not talk to
    /// the broker.
    pub fn to_service_bus_command(&self) -> AppResult<Option<ServiceBusCommand>> {
        let command = match self {
            Command::Peek {
                entity,
                count,
                from,
            } => ServiceBusCommand::PeekMessages {
                entity: entity.entity_ref()?,
                max_count: *count,
                from_sequence: *from,
            },
            Command::Delete { entity, message_id } => ServiceBusCommand::DeleteMessage {
                entity: entity.entity_ref()?,
                message_id: message_id.clone(),
            },
            Command::DeadLetter {
                entity,
                message_id,
                reason,
                description,
            } => ServiceBusCommand::DeadLetterMessage {
                entity: entity.entity_ref()?,
                message_id: message_id.clone(),
                reason: reason.clone(),
                error_description: description.clone(),
            },
            Command::Resubmit { entity, sequence } => ServiceBusCommand::ResubmitDeadLetter {
                entity: entity.entity_ref()?,
                sequence: *sequence,
            },
            Command::Purge { entity } => ServiceBusCommand::PurgeMessages {
                entity: entity.entity_ref()?,
            },
            Command::Transfer { entity } => ServiceBusCommand::TransferDeadLetters {
                entity: entity.entity_ref()?,
            },
            Command::Move {
                entity,
                message_id,
                destination,
            } => ServiceBusCommand::MoveMessage {
                source: entity.entity_ref()?,
                message_id: message_id.clone(),
                destination: destination.clone(),
            },
            Command::Send {
                entity_name,
                body,
                body_file,
                message_id,
                label,
                content_type,
                correlation_id,
                ttl,
                properties,
            } => {
                let content = match (body, body_file) {
                    (Some(body), _) => body.as_bytes().to_vec(),
                    (None, Some(path)) => std::fs::read(path)?,
                    (None, None) => {
                        return Err(AppError::Usage(
                            "send needs --body or --body-file".to_string(),
                        ));
                    }
                };

                let mut message = OutboundMessage {
                    content,
                    message_id: Some(
                        message_id
                            .clone()
                            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                    ),
                    content_type: content_type.clone(),
                    label: label.clone(),
                    correlation_id: correlation_id.clone(),
                    time_to_live: ttl.map(Duration::from_secs),
                    custom_properties: Vec::new(),
                };
                for property in properties {
                    let (key, value) = parse_property(property)?;
                    message = message.with_property(key, value);
                }

                ServiceBusCommand::SendMessage {
                    entity_name: entity_name.clone(),
                    message,
                }
            }
            Command::CheckUpdate => return Ok(None),
        };
        Ok(Some(command))
    }
}

fn parse_property(raw: &str) -> AppResult<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(AppError::Usage(format!(
            "property '{raw}' must have the form KEY=VALUE"
        ))),
    }
}

/// Runs the parsed command and returns what to print.
pub async fn run(cli: &Cli, config: &AppConfig) -> AppResult<Rendered> {
    let Some(command) = cli.command.to_service_bus_command()? else {
        let status = update_check::check_for_update(config.update_check()).await?;
        return Ok(Rendered {
            outcome: Outcome::Success,
            text: output::render_update_status(&status, cli.json)?,
        });
    };

    let connection_string = config.servicebus().connection_string().ok_or_else(|| {
        AppError::Usage(
            "no connection string configured; set servicebus.connection_string in config.toml \
             or SERVICEBUS__CONNECTION_STRING"
                .to_string(),
        )
    })?;
    let descriptor = ConnectionDescriptor::parse(connection_string)?;
    let connection = AzureConnection::connect(descriptor).await?;
    let manager = ServiceBusManager::new(connection, config.lock_cycle().clone());

    log::info!("Running {}", command.name());
    let response = manager.execute_command(command).await;
    if let Err(e) = manager.close().await {
        log::warn!("Failed to close Service Bus connection: {}", e);
    }
    output::render_response(response, cli.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;

    #[test]
    fn property_splits_on_first_equals() {
        assert_eq!(assert_ok!(parse_property("filter=a=b")), ("filter", "a=b"));
        assert_eq!(assert_ok!(parse_property(" tenant =contoso")), ("tenant", "contoso"));
        assert_err!(parse_property("=value"));
        assert_err!(parse_property("novalue"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
