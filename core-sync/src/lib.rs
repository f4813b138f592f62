//! # Contact Sync Module
//!
//! Replaces a user's stored contacts with the contents of their Google
//! contact feed.
//!
//! ## Overview
//!
//! - **Contact Mapper** (`mapper`): turns typed feed entries into normalized
//!   [`Contact`](bridge_traits::Contact) records, fetching photos on the way
//! - **Sync Orchestrator** (`orchestrator`): authenticate, resolve the default
//!   group, list its contacts, map them, replace storage
//!
//! Every sync is a full replace. There is no incremental mode.

pub mod error;
pub mod mapper;
pub mod orchestrator;

pub use error::{Result, SyncError};
pub use mapper::{map_entry, ContactMapper, MappedContacts, MappedEntry, PhotoSource};
pub use orchestrator::{SyncOrchestrator, SyncResult};
