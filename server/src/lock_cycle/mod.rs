//! # Lock-Cycle Engine
//!
//! Operations that receive messages under a lock, look for one of them and
//! resolve every received message to exactly one of settle, dead-letter or
//! abandon. Messages examined but not targeted always go back to their
//! backlog.
//!
//! ## Operations
//!
//! - [`delete_message`] / [`dead_letter_message`] - locate by id and resolve
//! - [`resubmit_dead_letter`] - peek by sequence, re-send, then delete the original
//! - [`move_message`] - locate by id and relocate to another entity
//! - [`purge`] / [`transfer_dead_letters`] - drain a backlog, optionally re-sending
//! - [`peek_messages`] / [`send_message`] - non-locking listing and ad-hoc send
//!
//! ## Failure Semantics
//!
//! A message that cannot be located is reported through [`SearchOutcome`] or
//! [`ResubmitOutcome`], never as an error. Not found means a receive came back
//! empty; a search that cannot get past messages it already holds fails as
//! stalled instead. Broker failures are returned as-is without retries. Composite operations that fail between steps return a
//! partial failure naming the step that already took effect:
//!
//! - resubmit: clone in the main backlog, original still dead-lettered
//! - move: clone at the destination, original still at the source
//! - transfer: the batch being re-sent is lost
//!
//! ## Usage
//!
//! ```no_run
//! use server::connection::AzureConnection;
//! use server::lock_cycle::{self, LockCycleConfig, SearchOutcome};
//! use server::service_bus_manager::EntityRef;
//!
//! async fn example(connection: &AzureConnection) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LockCycleConfig::default();
//!     let dlq = EntityRef::queue("orders").dead_letter();
//!
//!     match lock_cycle::delete_message(connection, &dlq, "order-17", &config).await? {
//!         SearchOutcome::Found(message) => println!("deleted {}", message.id),
//!         SearchOutcome::NotFound => println!("not found"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod bulk;
pub mod operations;
pub mod search;
mod session;
pub mod types;

pub use bulk::{purge, transfer_dead_letters};
pub use operations::{
    dead_letter_message, delete_message, move_message, peek_messages, resubmit_dead_letter,
    send_message,
};
pub use search::{DeadLetter, Relocate, Resolution, Settle, id_matches, search_and_resolve};
pub use types::{AbandonPolicy, LockCycleConfig, ResubmitOutcome, SearchOutcome};
