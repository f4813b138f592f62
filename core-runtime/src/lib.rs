//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the contacts sync core:
//! - Logging and tracing infrastructure
//! - Configuration management (OAuth client, feed endpoints, injected bridges)
//! - Default English message catalog
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the configuration and logging conventions used throughout
//! the system. Nothing in here talks to the network or to storage directly.

pub mod config;
pub mod error;
pub mod i18n;
pub mod logging;

pub use error::{Error, Result};

/// Tracing target shared by every auth and sync outcome log line
pub const LOG_TARGET: &str = "google_contacts";
