//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod api_service;
pub mod audit_logger;
pub mod config_loader;
pub mod file_writer;
pub mod llm_client;
pub mod progress;
