//! Workspace facade crate.
//!
//! Host applications depend on `contacts-sync` and get the assembled
//! [`ContactsService`](core_service::ContactsService) without wiring each
//! workspace crate individually. The `desktop-shims` feature (default) pulls in
//! the reqwest and SQLite adapters from `bridge-desktop`.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
