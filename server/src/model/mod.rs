pub use azure_core::time::OffsetDateTime;
pub use fe2o3_amqp_types::primitives::SimpleValue;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::time::Duration;

/// Point-in-time snapshot of a broker message.
///
/// A `Message` is a copy taken when the message was received or peeked. Changing
/// it never changes broker state; every broker-side change goes through the
/// lock-cycle operations, which identify messages by `id` (or by `sequence` for
/// the non-destructive dead-letter lookup).
///
/// # Examples
///
/// ```no_run
/// use server::model::{Message, OffsetDateTime};
///
/// let message = Message::new("order-17", 42, b"{\"total\": 10}".to_vec(), OffsetDateTime::now_utc());
/// assert_eq!(message.content_text(), "{\"total\": 10}");
/// ```
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Message {
    /// Broker-assigned message identifier
    pub id: String,
    /// Per-entity ordering key, stable across peek and receive
    pub sequence: i64,
    /// Raw payload
    #[serde(serialize_with = "serialize_content")]
    pub content: Vec<u8>,
    pub content_type: Option<String>,
    /// Subject of the message, shown as its label
    pub label: Option<String>,
    pub correlation_id: Option<String>,
    /// Broker-owned counter; changes every time a lock is released unsettled
    pub delivery_count: u32,
    pub time_to_live: Option<Duration>,
    /// When the message was enqueued in Service Bus
    #[serde(with = "azure_core::time::iso8601")]
    pub enqueued_at: OffsetDateTime,
    /// Only present on snapshots read from a dead-letter sub-queue
    pub dead_letter_reason: Option<String>,
    /// Application properties in the order the broker supplied them
    pub custom_properties: Vec<CustomProperty>,
    /// Whether the snapshot was read from a dead-letter sub-queue
    pub is_dlq: bool,
}

/// One application property attached to a message.
///
/// The value keeps its AMQP type, so an `Int` read from one message is sent
/// as an `Int` on the clone. Text is produced only for display.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CustomProperty {
    pub key: String,
    pub value: SimpleValue,
}

impl CustomProperty {
    pub fn new(key: impl Into<String>, value: impl Into<SimpleValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn display_value(&self) -> String {
        render_value(&self.value)
    }
}

impl Serialize for CustomProperty {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("CustomProperty", 2)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("value", &json_value(&self.value))?;
        state.end()
    }
}

impl Message {
    /// Creates a main-backlog snapshot with empty metadata.
    ///
    /// Mostly useful for tests and fakes; broker adapters fill every field.
    pub fn new(
        id: impl Into<String>,
        sequence: i64,
        content: Vec<u8>,
        enqueued_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            sequence,
            content,
            content_type: None,
            label: None,
            correlation_id: None,
            delivery_count: 0,
            time_to_live: None,
            enqueued_at,
            dead_letter_reason: None,
            custom_properties: Vec::new(),
            is_dlq: false,
        }
    }

    /// Decodes the payload as UTF-8 for display, replacing invalid sequences.
    pub fn content_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

fn serialize_content<S>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(content))
}

/// Renders an AMQP property value as plain text.
pub fn render_value(value: &SimpleValue) -> String {
    match value {
        SimpleValue::Null => "null".to_string(),
        SimpleValue::Bool(v) => v.to_string(),
        SimpleValue::Ubyte(v) => v.to_string(),
        SimpleValue::Ushort(v) => v.to_string(),
        SimpleValue::Uint(v) => v.to_string(),
        SimpleValue::Ulong(v) => v.to_string(),
        SimpleValue::Byte(v) => v.to_string(),
        SimpleValue::Short(v) => v.to_string(),
        SimpleValue::Int(v) => v.to_string(),
        SimpleValue::Long(v) => v.to_string(),
        SimpleValue::Float(v) => v.to_string(),
        SimpleValue::Double(v) => v.to_string(),
        SimpleValue::Char(v) => v.to_string(),
        SimpleValue::Timestamp(ts) => {
            let millis = ts.milliseconds();
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
                .map(|date| azure_core::time::to_rfc3339(&date))
                .unwrap_or_else(|_| format!("{millis}ms"))
        }
        SimpleValue::Uuid(v) => azure_core::Uuid::from_bytes(*v.as_inner()).to_string(),
        SimpleValue::Binary(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        SimpleValue::String(v) => v.clone(),
        SimpleValue::Symbol(v) => v.as_str().to_string(),
        // Decimals and described values have no natural text form
        other => format!("{other:?}"),
    }
}

/// JSON form of a property value: numbers, booleans and strings stay typed.
fn json_value(value: &SimpleValue) -> Value {
    match value {
        SimpleValue::Null => Value::Null,
        SimpleValue::Bool(v) => Value::from(*v),
        SimpleValue::Ubyte(v) => Value::from(*v),
        SimpleValue::Ushort(v) => Value::from(*v),
        SimpleValue::Uint(v) => Value::from(*v),
        SimpleValue::Ulong(v) => Value::from(*v),
        SimpleValue::Byte(v) => Value::from(*v),
        SimpleValue::Short(v) => Value::from(*v),
        SimpleValue::Int(v) => Value::from(*v),
        SimpleValue::Long(v) => Value::from(*v),
        SimpleValue::Double(v) => Value::from(v.0),
        SimpleValue::Float(v) => Value::from(f64::from(v.0)),
        SimpleValue::String(v) => Value::from(v.as_str()),
        other => Value::from(render_value(other)),
    }
}

/// A message about to be sent.
///
/// Either a clone of a received message (resubmit, transfer, move) or a message
/// composed by hand. Cloning keeps the payload and every user-visible property;
/// broker-assigned state (sequence number, delivery count, enqueue time,
/// dead-letter reason) is left for the broker to assign again.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutboundMessage {
    pub content: Vec<u8>,
    pub message_id: Option<String>,
    pub content_type: Option<String>,
    pub label: Option<String>,
    pub correlation_id: Option<String>,
    pub time_to_live: Option<Duration>,
    pub custom_properties: Vec<CustomProperty>,
}

impl OutboundMessage {
    /// Creates a message with a UTF-8 text body and no metadata.
    pub fn text(content: &str) -> Self {
        Self {
            content: content.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<SimpleValue>) -> Self {
        self.custom_properties.push(CustomProperty::new(key, value));
        self
    }
}

impl From<&Message> for OutboundMessage {
    fn from(message: &Message) -> Self {
        Self {
            content: message.content.clone(),
            message_id: Some(message.id.clone()),
            content_type: message.content_type.clone(),
            label: message.label.clone(),
            correlation_id: message.correlation_id.clone(),
            time_to_live: message.time_to_live,
            custom_properties: message.custom_properties.clone(),
        }
    }
}
