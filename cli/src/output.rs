//! Rendering of command responses for the terminal.

use crate::error::{AppError, AppResult};
use crate::update_check::UpdateStatus;
use serde_json::{Value, json};
use server::model::Message;
use server::service_bus_manager::ServiceBusResponse;

/// How a command ended, for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::NotFound => 2,
        }
    }
}

/// Text to print for a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub outcome: Outcome,
    /// Goes to stdout on success and stderr on not-found
    pub text: String,
}

/// Renders a response, turning [`ServiceBusResponse::Error`] into an [`AppError`].
pub fn render_response(response: ServiceBusResponse, json_output: bool) -> AppResult<Rendered> {
    let outcome = if response.is_not_found() {
        Outcome::NotFound
    } else {
        Outcome::Success
    };

    let text = if json_output {
        serde_json::to_string_pretty(&response_json(response)?)?
    } else {
        response_text(response)?
    };

    Ok(Rendered { outcome, text })
}

fn response_json(response: ServiceBusResponse) -> AppResult<Value> {
    Ok(match response {
        ServiceBusResponse::MessagesPeeked { messages } => json!({
            "status": "peeked",
            "messages": messages,
        }),
        ServiceBusResponse::MessageDeleted { message } => json!({
            "status": "deleted",
            "message": message,
        }),
        ServiceBusResponse::MessageDeadLettered { message } => json!({
            "status": "dead_lettered",
            "message": message,
        }),
        ServiceBusResponse::MessageResubmitted {
            message,
            original_removed,
        } => json!({
            "status": "resubmitted",
            "original_removed": original_removed,
            "message": message,
        }),
        ServiceBusResponse::MessagesPurged { count } => json!({
            "status": "purged",
            "count": count,
        }),
        ServiceBusResponse::DeadLettersTransferred { count } => json!({
            "status": "transferred",
            "count": count,
        }),
        ServiceBusResponse::MessageMoved {
            message,
            destination,
        } => json!({
            "status": "moved",
            "destination": destination,
            "message": message,
        }),
        ServiceBusResponse::MessageSent { entity_name } => json!({
            "status": "sent",
            "entity": entity_name,
        }),
        ServiceBusResponse::NotFound { entity, target } => json!({
            "status": "not_found",
            "entity": entity.to_string(),
            "target": target,
        }),
        ServiceBusResponse::Error { error } => return Err(AppError::ServiceBus(error)),
    })
}

fn response_text(response: ServiceBusResponse) -> AppResult<String> {
    Ok(match response {
        ServiceBusResponse::MessagesPeeked { messages } => {
            if messages.is_empty() {
                "No messages".to_string()
            } else {
                messages
                    .iter()
                    .map(message_line)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        ServiceBusResponse::MessageDeleted { message } => {
            format!("Deleted message {} (sequence {})", message.id, message.sequence)
        }
        ServiceBusResponse::MessageDeadLettered { message } => format!(
            "Dead-lettered message {} (sequence {})",
            message.id, message.sequence
        ),
        ServiceBusResponse::MessageResubmitted {
            message,
            original_removed,
        } => {
            let mut line = format!(
                "Resubmitted message {} (sequence {})",
                message.id, message.sequence
            );
            if !original_removed {
                line.push_str("; the original had already left the dead-letter queue");
            }
            line
        }
        ServiceBusResponse::MessagesPurged { count } => format!("Purged {count} messages"),
        ServiceBusResponse::DeadLettersTransferred { count } => {
            format!("Transferred {count} dead-lettered messages")
        }
        ServiceBusResponse::MessageMoved {
            message,
            destination,
        } => format!("Moved message {} to {destination}", message.id),
        ServiceBusResponse::MessageSent { entity_name } => format!("Sent message to {entity_name}"),
        ServiceBusResponse::NotFound { entity, target } => {
            format!("Message {target} not found in {entity}")
        }
        ServiceBusResponse::Error { error } => return Err(AppError::ServiceBus(error)),
    })
}

fn message_line(message: &Message) -> String {
    let mut line = format!(
        "#{:<8} {:<36} delivered {:>3}x  enqueued {}",
        message.sequence, message.id, message.delivery_count, message.enqueued_at
    );
    if let Some(reason) = &message.dead_letter_reason {
        line.push_str(&format!("  reason: {reason}"));
    }
    line.push_str(&format!("\n    {}", preview(&message.content_text())));
    line
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 120;
    let single_line = text.replace(['\r', '\n'], " ");
    if single_line.chars().count() > MAX_CHARS {
        let truncated: String = single_line.chars().take(MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        single_line
    }
}

pub fn render_update_status(status: &UpdateStatus, json_output: bool) -> AppResult<String> {
    if json_output {
        let value = match status {
            UpdateStatus::UpToDate { current } => json!({
                "status": "up_to_date",
                "current": current,
            }),
            UpdateStatus::Available {
                current,
                latest,
                url,
            } => json!({
                "status": "update_available",
                "current": current,
                "latest": latest,
                "url": url,
            }),
            UpdateStatus::Disabled => json!({ "status": "disabled" }),
        };
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    Ok(match status {
        UpdateStatus::UpToDate { current } => format!("busctl {current} is up to date"),
        UpdateStatus::Available {
            current,
            latest,
            url,
        } => match url {
            Some(url) => format!("busctl {latest} is available (current: {current}): {url}"),
            None => format!("busctl {latest} is available (current: {current})"),
        },
        UpdateStatus::Disabled => "Update check is disabled".to_string(),
    })
}
