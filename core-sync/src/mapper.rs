//! # Contact Mapper
//!
//! Maps feed entries onto [`Contact`] records.
//!
//! ## Rules
//!
//! - `fullName`, `givenName`, `familyName` and `additionalName` are trimmed;
//!   `namePrefix` and `nameSuffix` are kept verbatim.
//! - An empty full name falls back to the entry title.
//! - An entry with no name of any kind and no email is dropped.
//! - Emails and phones go under `email` / `phone`, or `email:<type>` /
//!   `phone:<type>` when their `rel` carries a `#type` suffix.
//! - The first photo link decides the photo. It is only fetched when it
//!   carries an etag, and a failed fetch leaves the contact without a photo.

use async_trait::async_trait;
use bridge_traits::Contact;
use provider_google_contacts::{parse_feed, ContactFeed, FeedEntry, FeedValue};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

/// Downloads contact photos
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Photo bytes behind `href`, or `None` when it cannot be fetched
    async fn fetch_photo(&self, href: &str) -> Option<Vec<u8>>;
}

/// A mapped entry and the photo it still needs, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedEntry {
    pub contact: Contact,
    pub photo_href: Option<String>,
}

/// Mapper output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedContacts {
    /// The feed had no entries at all
    Empty,
    /// Contacts in feed order. May be empty if every entry was dropped.
    Contacts(Vec<Contact>),
}

impl MappedContacts {
    pub fn len(&self) -> usize {
        match self {
            MappedContacts::Empty => 0,
            MappedContacts::Contacts(contacts) => contacts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Map one entry, or `None` if it has to be dropped
pub fn map_entry(entry: &FeedEntry) -> Option<MappedEntry> {
    let mut contact = Contact::default();

    if let Some(name) = &entry.name {
        contact.name = trimmed(&name.full_name);
        contact.firstname = trimmed(&name.given_name);
        contact.surname = trimmed(&name.family_name);
        contact.middlename = trimmed(&name.additional_name);
        contact.prefix = name.name_prefix.clone();
        contact.suffix = name.name_suffix.clone();
    }
    if contact.name.is_empty() {
        contact.name = entry.title.clone();
    }

    for email in &entry.emails {
        contact.push_value(field_key("email", email), email.value.clone());
    }
    for phone in &entry.phones {
        contact.push_value(field_key("phone", phone), phone.value.clone());
    }

    if contact.is_nameless() && !contact.has_email() {
        return None;
    }

    let photo_href = entry
        .links
        .iter()
        .find(|link| link.is_photo())
        .filter(|link| link.etag.is_some())
        .map(|link| link.href.clone());

    Some(MappedEntry {
        contact,
        photo_href,
    })
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn field_key(base: &str, value: &FeedValue) -> String {
    match value.rel_type() {
        Some(kind) => format!("{}:{}", base, kind),
        None => base.to_string(),
    }
}

/// Feed-to-contacts mapper
pub struct ContactMapper {
    photos: Arc<dyn PhotoSource>,
}

impl ContactMapper {
    pub fn new(photos: Arc<dyn PhotoSource>) -> Self {
        Self { photos }
    }

    /// Parse a contact feed document and map its entries
    pub async fn parse(&self, feed_xml: &str) -> Result<MappedContacts> {
        let feed = ContactFeed::from_entries(parse_feed(feed_xml)?);
        Ok(self.map_feed(feed).await)
    }

    /// Map every entry of `feed`, fetching photos one at a time
    pub async fn map_feed(&self, feed: ContactFeed) -> MappedContacts {
        let entries = match feed {
            ContactFeed::Empty => return MappedContacts::Empty,
            ContactFeed::Entries(entries) => entries,
        };

        let mut contacts = Vec::with_capacity(entries.len());
        for entry in &entries {
            let Some(MappedEntry {
                mut contact,
                photo_href,
            }) = map_entry(entry)
            else {
                debug!(id = ?entry.id, "Dropping entry without name or email");
                continue;
            };

            if let Some(href) = photo_href {
                contact.photo = self.photos.fetch_photo(&href).await;
            }
            contacts.push(contact);
        }

        MappedContacts::Contacts(contacts)
    }
}
