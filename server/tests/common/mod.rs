//! In-memory broker doubles shared by the integration tests.
//!
//! [`InMemoryBroker`] keeps every backlog in memory with peek-lock semantics,
//! records each broker call in an action log and supports fault injection.
//! [`ScriptedReceiver`] replays fixed batches, for checking the search
//! primitive against arbitrary receive sequences.

#![allow(dead_code)]

use async_trait::async_trait;
use server::broker::{BrokerConnection, BrokerMessage, LockedReceiver, MessageSink, ReceiveMode};
use server::model::{CustomProperty, Message, OffsetDateTime, OutboundMessage};
use server::service_bus_manager::{EntityRef, ServiceBusError, ServiceBusResult};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One broker call, as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Received { entity: String, sequences: Vec<i64> },
    Completed { entity: String, sequence: i64 },
    Abandoned { entity: String, sequence: i64 },
    DeadLettered { entity: String, sequence: i64 },
    Peeked { entity: String },
    Sent { entity: String, ids: Vec<String> },
    ReceiverDisposed { entity: String },
    SenderDisposed { entity: String },
    ConnectionClosed,
}

/// Faults injected into the in-memory broker.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Every complete call fails
    pub fail_complete: bool,
    /// Abandon calls for these sequences fail
    pub fail_abandon: Vec<i64>,
    /// Send calls fail once this many have succeeded
    pub fail_send_after: Option<usize>,
    /// Receive calls fail once this many have succeeded
    pub fail_receive_after: Option<usize>,
}

#[derive(Clone)]
pub struct FakeMessage {
    message: Message,
}

impl FakeMessage {
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

impl BrokerMessage for FakeMessage {
    fn message_id(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.message.id))
    }

    fn sequence_number(&self) -> i64 {
        self.message.sequence
    }

    fn snapshot(&self, is_dlq: bool) -> Message {
        let mut snapshot = self.message.clone();
        snapshot.is_dlq = is_dlq;
        if !is_dlq {
            snapshot.dead_letter_reason = None;
        }
        snapshot
    }
}

pub fn message(id: impl Into<String>, sequence: i64) -> Message {
    Message::new(
        id,
        sequence,
        format!("payload-{sequence}").into_bytes(),
        OffsetDateTime::UNIX_EPOCH,
    )
}

#[derive(Default)]
struct BrokerState {
    backlogs: HashMap<String, Vec<Message>>,
    locked: HashSet<(String, i64)>,
    topics: HashMap<String, Vec<String>>,
    next_sequence: i64,
    actions: Vec<Action>,
    faults: Faults,
    receive_calls: usize,
    send_calls: usize,
    open_receivers: usize,
    open_senders: usize,
    closed: bool,
}

impl BrokerState {
    fn allocate_sequence(&mut self) -> i64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    fn push(&mut self, path: String, message: Message) {
        let backlog = self.backlogs.entry(path).or_default();
        backlog.push(message);
        backlog.sort_by_key(|m| m.sequence);
    }

    fn take(&mut self, path: &str, sequence: i64) -> Option<Message> {
        let backlog = self.backlogs.get_mut(path)?;
        let index = backlog.iter().position(|m| m.sequence == sequence)?;
        Some(backlog.remove(index))
    }

    fn send_paths(&self, entity: &str) -> Vec<String> {
        match self.topics.get(entity) {
            Some(subscriptions) => subscriptions
                .iter()
                .map(|sub| EntityRef::subscription(entity, sub.as_str()).path())
                .collect(),
            None => vec![entity.to_string()],
        }
    }
}

/// Namespace double with peek-lock semantics.
///
/// Receives return unlocked messages in sequence order. Abandoned messages
/// become receivable again immediately with their delivery count raised,
/// the way the real broker behaves.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topic(self, topic: &str, subscriptions: &[&str]) -> Self {
        self.state.lock().unwrap().topics.insert(
            topic.to_string(),
            subscriptions.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Enqueues `count` messages with ids `{prefix}-{sequence}`.
    pub fn seed(&self, entity: &EntityRef, prefix: &str, count: usize) -> Vec<Message> {
        (0..count)
            .map(|_| {
                let mut state = self.state.lock().unwrap();
                let sequence = state.allocate_sequence();
                let mut m = message(format!("{prefix}-{sequence}"), sequence);
                m.is_dlq = entity.is_dlq();
                if entity.is_dlq() {
                    m.dead_letter_reason = Some("MaxDeliveryCountExceeded".to_string());
                }
                state.push(entity.path(), m.clone());
                m
            })
            .collect()
    }

    /// Replaces the application properties of a stored message.
    pub fn set_properties(&self, entity: &EntityRef, sequence: i64, properties: Vec<CustomProperty>) {
        let mut state = self.state.lock().unwrap();
        let m = state
            .backlogs
            .get_mut(&entity.path())
            .and_then(|backlog| backlog.iter_mut().find(|m| m.sequence == sequence))
            .expect("message is seeded");
        m.custom_properties = properties;
    }

    pub fn messages(&self, entity: &EntityRef) -> Vec<Message> {
        let state = self.state.lock().unwrap();
        state.backlogs.get(&entity.path()).cloned().unwrap_or_default()
    }

    pub fn count(&self, entity: &EntityRef) -> usize {
        self.messages(entity).len()
    }

    pub fn ids(&self, entity: &EntityRef) -> Vec<String> {
        self.messages(entity).into_iter().map(|m| m.id).collect()
    }

    pub fn locked_count(&self) -> usize {
        self.state.lock().unwrap().locked.len()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn receive_calls(&self) -> usize {
        self.state.lock().unwrap().receive_calls
    }

    /// Receivers and senders opened but not yet disposed.
    pub fn open_handles(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.open_receivers, state.open_senders)
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn set_faults(&self, faults: Faults) {
        self.state.lock().unwrap().faults = faults;
    }
}

#[async_trait]
impl BrokerConnection for InMemoryBroker {
    type Receiver = FakeReceiver;
    type Sender = FakeSender;

    async fn open_receiver(
        &self,
        entity: &EntityRef,
        mode: ReceiveMode,
    ) -> ServiceBusResult<FakeReceiver> {
        self.state.lock().unwrap().open_receivers += 1;
        Ok(FakeReceiver {
            state: self.state.clone(),
            path: entity.path(),
            mode,
            is_dlq: entity.is_dlq(),
            disposed: false,
        })
    }

    async fn open_sender(&self, entity_name: &str) -> ServiceBusResult<FakeSender> {
        self.state.lock().unwrap().open_senders += 1;
        Ok(FakeSender {
            state: self.state.clone(),
            entity: entity_name.to_string(),
            disposed: false,
        })
    }

    async fn close(self) -> ServiceBusResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(ServiceBusError::ResourceDisposed("Connection"));
        }
        state.closed = true;
        state.actions.push(Action::ConnectionClosed);
        Ok(())
    }
}

pub struct FakeReceiver {
    state: Arc<Mutex<BrokerState>>,
    path: String,
    mode: ReceiveMode,
    is_dlq: bool,
    disposed: bool,
}

impl FakeReceiver {
    fn check(&self) -> ServiceBusResult<()> {
        if self.disposed {
            Err(ServiceBusError::ResourceDisposed("Receiver"))
        } else {
            Ok(())
        }
    }

    fn unlock(&self, state: &mut BrokerState, sequence: i64) -> ServiceBusResult<()> {
        if state.locked.remove(&(self.path.clone(), sequence)) {
            Ok(())
        } else {
            Err(ServiceBusError::MessageCompleteFailed(format!(
                "lock for sequence {sequence} lost"
            )))
        }
    }
}

#[async_trait]
impl LockedReceiver for FakeReceiver {
    type Message = FakeMessage;

    async fn receive_messages(
        &mut self,
        max_count: u32,
        _timeout: Duration,
    ) -> ServiceBusResult<Vec<FakeMessage>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();

        if let Some(limit) = state.faults.fail_receive_after {
            if state.receive_calls >= limit {
                return Err(ServiceBusError::MessageReceiveFailed(
                    "connection reset by peer".to_string(),
                ));
            }
        }
        state.receive_calls += 1;

        let available: Vec<Message> = state
            .backlogs
            .get(&self.path)
            .map(|backlog| {
                backlog
                    .iter()
                    .filter(|m| !state.locked.contains(&(self.path.clone(), m.sequence)))
                    .take(max_count as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for m in &available {
            match self.mode {
                ReceiveMode::PeekLock => {
                    state.locked.insert((self.path.clone(), m.sequence));
                }
                ReceiveMode::ReceiveAndDelete => {
                    state.take(&self.path, m.sequence);
                }
            }
        }

        state.actions.push(Action::Received {
            entity: self.path.clone(),
            sequences: available.iter().map(|m| m.sequence).collect(),
        });
        Ok(available.into_iter().map(FakeMessage::new).collect())
    }

    async fn peek_messages(
        &mut self,
        max_count: u32,
        from_sequence_number: Option<i64>,
    ) -> ServiceBusResult<Vec<Message>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.actions.push(Action::Peeked {
            entity: self.path.clone(),
        });
        let from = from_sequence_number.unwrap_or(i64::MIN);
        Ok(state
            .backlogs
            .get(&self.path)
            .map(|backlog| {
                backlog
                    .iter()
                    .filter(|m| m.sequence >= from)
                    .take(max_count as usize)
                    .cloned()
                    .map(|mut m| {
                        m.is_dlq = self.is_dlq;
                        m
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn complete_message(&mut self, message: &FakeMessage) -> ServiceBusResult<()> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if state.faults.fail_complete {
            return Err(ServiceBusError::MessageCompleteFailed(
                "link detached".to_string(),
            ));
        }
        let sequence = message.sequence_number();
        self.unlock(&mut state, sequence)?;
        state.take(&self.path, sequence);
        state.actions.push(Action::Completed {
            entity: self.path.clone(),
            sequence,
        });
        Ok(())
    }

    async fn abandon_message(&mut self, message: &FakeMessage) -> ServiceBusResult<()> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let sequence = message.sequence_number();
        if state.faults.fail_abandon.contains(&sequence) {
            return Err(ServiceBusError::MessageAbandonFailed(
                "link detached".to_string(),
            ));
        }
        self.unlock(&mut state, sequence)
            .map_err(|e| ServiceBusError::MessageAbandonFailed(e.to_string()))?;
        if let Some(m) = state
            .backlogs
            .get_mut(&self.path)
            .and_then(|backlog| backlog.iter_mut().find(|m| m.sequence == sequence))
        {
            m.delivery_count += 1;
        }
        state.actions.push(Action::Abandoned {
            entity: self.path.clone(),
            sequence,
        });
        Ok(())
    }

    async fn dead_letter_message(
        &mut self,
        message: &FakeMessage,
        reason: Option<String>,
        _error_description: Option<String>,
    ) -> ServiceBusResult<()> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let sequence = message.sequence_number();
        self.unlock(&mut state, sequence)
            .map_err(|e| ServiceBusError::MessageDeadLetterFailed(e.to_string()))?;
        if let Some(mut m) = state.take(&self.path, sequence) {
            m.is_dlq = true;
            m.dead_letter_reason = reason;
            let dlq_path = format!("{}/$deadletterqueue", self.path);
            state.push(dlq_path, m);
        }
        state.actions.push(Action::DeadLettered {
            entity: self.path.clone(),
            sequence,
        });
        Ok(())
    }

    async fn dispose(&mut self) -> ServiceBusResult<()> {
        self.check()?;
        self.disposed = true;
        let mut state = self.state.lock().unwrap();
        state.open_receivers -= 1;
        state.actions.push(Action::ReceiverDisposed {
            entity: self.path.clone(),
        });
        Ok(())
    }
}

pub struct FakeSender {
    state: Arc<Mutex<BrokerState>>,
    entity: String,
    disposed: bool,
}

#[async_trait]
impl MessageSink for FakeSender {
    async fn send_messages(&mut self, messages: Vec<OutboundMessage>) -> ServiceBusResult<()> {
        if self.disposed {
            return Err(ServiceBusError::ResourceDisposed("Sender"));
        }
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = state.faults.fail_send_after {
            if state.send_calls >= limit {
                return Err(ServiceBusError::MessageSendFailed(
                    "quota exceeded".to_string(),
                ));
            }
        }
        state.send_calls += 1;

        let paths = state.send_paths(&self.entity);
        let mut ids = Vec::new();
        for outbound in messages {
            for path in &paths {
                let sequence = state.allocate_sequence();
                let id = outbound
                    .message_id
                    .clone()
                    .unwrap_or_else(|| format!("generated-{sequence}"));
                let mut m = Message::new(
                    id.clone(),
                    sequence,
                    outbound.content.clone(),
                    OffsetDateTime::UNIX_EPOCH,
                );
                m.content_type = outbound.content_type.clone();
                m.label = outbound.label.clone();
                m.correlation_id = outbound.correlation_id.clone();
                m.time_to_live = outbound.time_to_live;
                m.custom_properties = outbound.custom_properties.clone();
                state.push(path.clone(), m);
                ids.push(id);
            }
        }
        state.actions.push(Action::Sent {
            entity: self.entity.clone(),
            ids,
        });
        Ok(())
    }

    async fn dispose(&mut self) -> ServiceBusResult<()> {
        if self.disposed {
            return Err(ServiceBusError::ResourceDisposed("Sender"));
        }
        self.disposed = true;
        let mut state = self.state.lock().unwrap();
        state.open_senders -= 1;
        state.actions.push(Action::SenderDisposed {
            entity: self.entity.clone(),
        });
        Ok(())
    }
}

/// Replays fixed batches of sequence numbers, then empty batches.
///
/// Message ids are `m-{sequence}`. Every call is logged; settlement calls do
/// not check locks.
pub struct ScriptedReceiver {
    batches: VecDeque<Vec<i64>>,
    pub actions: Vec<Action>,
    pub receive_calls: usize,
    /// Receive calls fail once this many have succeeded
    pub fail_receive_after: Option<usize>,
}

impl ScriptedReceiver {
    pub const ENTITY: &'static str = "scripted";

    pub fn new(batches: Vec<Vec<i64>>) -> Self {
        Self {
            batches: batches.into(),
            actions: Vec::new(),
            receive_calls: 0,
            fail_receive_after: None,
        }
    }

    pub fn abandoned(&self) -> Vec<i64> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Abandoned { sequence, .. } => Some(*sequence),
                _ => None,
            })
            .collect()
    }

    /// Sequences that were completed or dead-lettered.
    pub fn resolved(&self) -> Vec<i64> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Completed { sequence, .. } | Action::DeadLettered { sequence, .. } => {
                    Some(*sequence)
                }
                _ => None,
            })
            .collect()
    }

    fn log(&mut self, make: impl FnOnce(String) -> Action) {
        self.actions.push(make(Self::ENTITY.to_string()));
    }
}

#[async_trait]
impl LockedReceiver for ScriptedReceiver {
    type Message = FakeMessage;

    async fn receive_messages(
        &mut self,
        _max_count: u32,
        _timeout: Duration,
    ) -> ServiceBusResult<Vec<FakeMessage>> {
        if let Some(limit) = self.fail_receive_after {
            if self.receive_calls >= limit {
                return Err(ServiceBusError::MessageReceiveFailed(
                    "connection reset by peer".to_string(),
                ));
            }
        }
        self.receive_calls += 1;
        let sequences = self.batches.pop_front().unwrap_or_default();
        self.log(|entity| Action::Received {
            entity,
            sequences: sequences.clone(),
        });
        Ok(sequences
            .into_iter()
            .map(|s| FakeMessage::new(message(format!("m-{s}"), s)))
            .collect())
    }

    async fn peek_messages(
        &mut self,
        _max_count: u32,
        _from_sequence_number: Option<i64>,
    ) -> ServiceBusResult<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn complete_message(&mut self, message: &FakeMessage) -> ServiceBusResult<()> {
        let sequence = message.sequence_number();
        self.log(|entity| Action::Completed { entity, sequence });
        Ok(())
    }

    async fn abandon_message(&mut self, message: &FakeMessage) -> ServiceBusResult<()> {
        let sequence = message.sequence_number();
        self.log(|entity| Action::Abandoned { entity, sequence });
        Ok(())
    }

    async fn dead_letter_message(
        &mut self,
        message: &FakeMessage,
        _reason: Option<String>,
        _error_description: Option<String>,
    ) -> ServiceBusResult<()> {
        let sequence = message.sequence_number();
        self.log(|entity| Action::DeadLettered { entity, sequence });
        Ok(())
    }

    async fn dispose(&mut self) -> ServiceBusResult<()> {
        self.log(|entity| Action::ReceiverDisposed { entity });
        Ok(())
    }
}

/// Runs a future to completion on a fresh current-thread runtime, for use
/// inside `proptest!` bodies.
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}
