//! # Host Bridge Traits
//!
//! Contracts between the contacts sync core and the host application.
//!
//! ## Overview
//!
//! The core never reaches for ambient host state. Everything it needs from the
//! outside world (transport, per-user preferences, contact storage, message
//! lookup, time) is injected as one of the traits below.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations; a single attempt per call
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Per-user key/value preferences
//! - [`ContactStore`](contacts::ContactStore) - Per-user contact persistence (delete-all + insert)
//!
//! ### Host Integration
//! - [`Localizer`](i18n::Localizer) - Message key to user-facing text
//! - [`Clock`](clock::Clock) - Time source for deterministic token expiry checks
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific errors into it and keep messages free of
//! credentials.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared as
//! `Arc<dyn Trait>` across async tasks.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         todo!()
//!     }
//! }
//! ```

pub mod clock;
pub mod contacts;
pub mod error;
pub mod http;
pub mod i18n;
pub mod log;
pub mod storage;
pub mod user;

pub use error::BridgeError;

pub use clock::{Clock, FixedClock, SystemClock};
pub use contacts::{Contact, ContactStore};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use i18n::{Localizer, MessageKey, MESSAGE_DOMAIN};
pub use log::{LogEntry, LogLevel, LoggerSink};
pub use storage::{SettingValue, SettingsStore};
pub use user::UserId;
