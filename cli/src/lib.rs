//! # busctl CLI Library
//!
//! Command-line front-end for the busctl lock-cycle engine: argument parsing,
//! layered configuration, logging setup, output rendering and the release
//! update check.
//!
//! ## Modules
//!
//! - [`commands`] - clap command definitions and dispatch to the service bus manager
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Application error type
//! - [`logger`] - fern logger setup
//! - [`output`] - Text and JSON rendering of responses
//! - [`update_check`] - GitHub release check
//!
//! This library interface enables integration testing by providing access to internal modules.

pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod output;
pub mod update_check;
