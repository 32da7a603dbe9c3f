//! # warden-gateway
//!
//! The trust boundary between what the model asks for and what actually runs.
//!
//! This crate provides:
//! - `ToolRegistry`, the immutable name → tool map built once at startup
//! - `SecureGateway`, which runs every action through lookup, schema
//!   validation, path sandboxing and command filtering before execution
//! - The individual gates (`validate`, `sandbox`, `filter`) as plain functions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_gateway::{SecureGateway, ToolRegistry};
//!
//! let registry = Arc::new(ToolRegistry::new(tools)?);
//! let gateway = SecureGateway::new(registry, "/srv/agent/workspace");
//! ```

pub mod filter;
pub mod gateway;
pub mod registry;
pub mod sandbox;
pub mod validate;

pub use gateway::{secure_execute, SecureGateway};
pub use registry::ToolRegistry;
