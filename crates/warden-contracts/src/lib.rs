//! # warden-contracts
//!
//! Shared types, the tool contract, and errors for the WARDEN runtime.
//!
//! All crates in the workspace import from here. No loop or gateway logic
//! lives in this crate, only data definitions and the `Tool` trait.

pub mod agent;
pub mod config;
pub mod error;
pub mod event;
pub mod tool;
