//! # Service Bus Manager Module
//!
//! Command/response facade over the lock-cycle engine.
//!
//! ## Core Components
//!
//! - [`ServiceBusManager`] - Executes commands against an injected broker connection
//! - [`ServiceBusCommand`] / [`ServiceBusResponse`] - Command/response pattern for operations
//! - [`EntityRef`] - Addresses one queue, subscription or dead-letter sub-queue
//! - [`ServiceBusError`] - Configuration, transport and partial-failure errors
//!
//! ## Usage
//!
//! ```no_run
//! use server::connection::{AzureConnection, ConnectionDescriptor};
//! use server::lock_cycle::LockCycleConfig;
//! use server::service_bus_manager::{EntityRef, ServiceBusCommand, ServiceBusManager, ServiceBusResponse};
//!
//! async fn example(connection_string: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = AzureConnection::connect(ConnectionDescriptor::parse(connection_string)?).await?;
//!     let manager = ServiceBusManager::new(connection, LockCycleConfig::default());
//!
//!     let command = ServiceBusCommand::ResubmitDeadLetter {
//!         entity: EntityRef::queue("orders"),
//!         sequence: 42,
//!     };
//!     if let ServiceBusResponse::Error { error } = manager.execute_command(command).await {
//!         eprintln!("Resubmit failed: {error}");
//!     }
//!     Ok(())
//! }
//! ```

pub use self::commands::ServiceBusCommand;
pub use self::errors::{ServiceBusError, ServiceBusResult};
pub use self::manager::ServiceBusManager;
pub use self::responses::ServiceBusResponse;
pub use self::types::*;

/// Command handlers for processing Service Bus operations
pub mod command_handlers;
/// Command definitions for Service Bus operations
pub mod commands;
/// Error types and handling for Service Bus operations
pub mod errors;
/// Main Service Bus Manager implementation
pub mod manager;
/// Response types for Service Bus operations
pub mod responses;
/// Entity addressing types
pub mod types;
