use super::errors::{ServiceBusError, ServiceBusResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const DEAD_LETTER_SUFFIX: &str = "/$deadletterqueue";
const SUBSCRIPTIONS_SEGMENT: &str = "/Subscriptions/";

/// Identifies exactly one receivable backlog.
///
/// A queue's main backlog, a queue's dead-letter sub-queue, a subscription's
/// main backlog, or a subscription's dead-letter sub-queue.
///
/// # Examples
///
/// ```no_run
/// use server::service_bus_manager::EntityRef;
///
/// let orders = EntityRef::queue("orders");
/// assert_eq!(orders.dead_letter().path(), "orders/$deadletterqueue");
///
/// let audit = EntityRef::subscription("events", "audit");
/// assert_eq!(audit.path(), "events/Subscriptions/audit");
/// assert_eq!(audit.send_target(), "events");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    entity_name: String,
    subscription_name: Option<String>,
    is_dlq: bool,
}

impl EntityRef {
    pub fn queue(name: impl Into<String>) -> Self {
        Self {
            entity_name: name.into(),
            subscription_name: None,
            is_dlq: false,
        }
    }

    pub fn subscription(topic: impl Into<String>, subscription: impl Into<String>) -> Self {
        Self {
            entity_name: topic.into(),
            subscription_name: Some(subscription.into()),
            is_dlq: false,
        }
    }

    /// The dead-letter sub-queue of the same queue or subscription.
    pub fn dead_letter(&self) -> Self {
        Self {
            is_dlq: true,
            ..self.clone()
        }
    }

    /// The main backlog of the same queue or subscription.
    pub fn main(&self) -> Self {
        Self {
            is_dlq: false,
            ..self.clone()
        }
    }

    pub fn with_dlq(self, is_dlq: bool) -> Self {
        Self { is_dlq, ..self }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn subscription_name(&self) -> Option<&str> {
        self.subscription_name.as_deref()
    }

    pub fn is_dlq(&self) -> bool {
        self.is_dlq
    }

    /// Broker path of the backlog, e.g. `topic/Subscriptions/sub/$deadletterqueue`.
    pub fn path(&self) -> String {
        let mut path = match &self.subscription_name {
            Some(sub) => format!("{}{SUBSCRIPTIONS_SEGMENT}{sub}", self.entity_name),
            None => self.entity_name.clone(),
        };
        if self.is_dlq {
            path.push_str(DEAD_LETTER_SUFFIX);
        }
        path
    }

    /// Entity a clone is sent to when it goes back to the main backlog.
    ///
    /// Subscriptions cannot be sent to directly, so their clones go to the
    /// topic, which delivers them to every subscription whose filter matches.
    pub fn send_target(&self) -> &str {
        &self.entity_name
    }

    /// Rejects references that cannot address a backlog.
    pub fn validate(&self) -> ServiceBusResult<()> {
        validate_name("entity name", &self.entity_name)?;
        if let Some(sub) = &self.subscription_name {
            validate_name("subscription name", sub)?;
            if sub.contains('/') {
                return Err(ServiceBusError::InvalidEntityReference(format!(
                    "subscription name '{sub}' must not contain '/'"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Validates a queue, topic or subscription name used as an operation target.
///
/// Queue and topic names may contain `/` (`sales/orders`); subscription names
/// are checked for it separately by [`EntityRef::validate`].
pub fn validate_name(kind: &str, name: &str) -> ServiceBusResult<()> {
    if name.is_empty() {
        return Err(ServiceBusError::InvalidEntityReference(format!(
            "{kind} cannot be empty"
        )));
    }
    if name.trim() != name {
        return Err(ServiceBusError::InvalidEntityReference(format!(
            "{kind} '{name}' has leading or trailing whitespace"
        )));
    }
    if name.contains('$') || name.ends_with(DEAD_LETTER_SUFFIX) {
        return Err(ServiceBusError::InvalidEntityReference(format!(
            "{kind} '{name}' addresses a sub-queue; use the dead-letter flag instead"
        )));
    }
    Ok(())
}
