//! # Authentication Module
//!
//! OAuth 2.0 token lifecycle for the Google contacts feed.
//!
//! ## Overview
//!
//! Every sync starts here. The stored token is classified into one of three
//! states and the manager takes exactly one step to reach a usable token:
//!
//! | Stored state | Step | Failure |
//! |--------------|------|---------|
//! | no token | exchange the stored auth code | `NoAuthCode` |
//! | expired | refresh with the refresh token | `NoRefreshToken` |
//! | valid | reuse it | - |
//!
//! When the token endpoint answers `invalid_grant`, every piece of stored auth
//! state (token, auth code, autosync flag) is cleared so the next attempt starts
//! from a clean slate.
//!
//! ## Components
//!
//! - [`TokenStore`] - token, auth code and sync flags on top of the host's per-user settings
//! - [`OAuthClient`] - consent URL, code exchange and refresh against the token endpoint
//! - [`AuthManager`] - the state machine, persistence and outcome logging

pub mod error;
pub mod manager;
pub mod oauth;
pub mod token_store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::{AuthError, Result};
pub use manager::AuthManager;
pub use oauth::OAuthClient;
pub use token_store::TokenStore;
pub use types::{next_step, AuthResult, AuthStep, OAuthToken, TokenState};
