//! # Google Contacts Feed Provider
//!
//! Client for the Google Contacts GData feed (protocol version 3.0).
//!
//! ## Overview
//!
//! This module provides:
//! - Feed URL construction for the group and contact listings
//! - Status classification of every feed response (`200` / `401` / `403` / other)
//! - A typed schema of the Atom/GData entry ([`FeedEntry`]) and the parser producing it
//! - Authenticated photo download
//!
//! Requests are made exactly once. Retry policy, if any, belongs to the caller.

pub mod client;
pub mod error;
pub mod parser;
pub mod types;

pub use client::{FeedClient, FeedResponse};
pub use error::{FeedError, Result};
pub use parser::parse_feed;
pub use types::{ContactFeed, FeedEntry, FeedLink, FeedName, FeedValue, PHOTO_REL};
