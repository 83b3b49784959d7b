//! # busctl Server Library
//!
//! Core library for inspecting and repairing Azure Service Bus backlogs.
//! It provides the message lock-cycle engine, the broker abstraction it runs
//! against, an Azure Service Bus adapter and a command/response facade.
//!
//! ## Modules
//!
//! - [`broker`] - Request-scoped receiver, sender and connection traits
//! - [`connection`] - Connection string parsing and the Azure connection
//! - [`consumer`] - Azure receiver adapter
//! - [`producer`] - Azure sender adapter
//! - [`lock_cycle`] - Search, resolve, drain and transfer operations
//! - [`model`] - Message snapshots and outbound messages
//! - [`service_bus_manager`] - Command facade, entity references and errors

pub mod broker;
pub mod connection;
pub mod consumer;
pub mod lock_cycle;
pub mod model;
pub mod producer;
pub mod service_bus_manager;
