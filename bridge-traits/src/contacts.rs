//! Normalized Contact Records and Storage
//!
//! [`Contact`] is the provider-independent record the sync pipeline produces.
//! [`ContactStore`] is the host's per-user contact storage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::user::UserId;

/// Normalized contact record.
///
/// Multi-valued fields (emails, phones) live in `fields`, keyed by a label
/// such as `email`, `email:work` or `phone:mobile`. Values under one key keep
/// the order in which they were first seen.
///
/// # Examples
///
/// ```
/// use bridge_traits::Contact;
///
/// let mut contact = Contact::default();
/// contact.name = "Ada Lovelace".to_string();
/// contact.push_value("email:home", "ada@example.org");
/// contact.push_value("email:home", "ada@analytical.engine");
///
/// assert_eq!(contact.values("email:home").len(), 2);
/// assert!(contact.has_email());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub firstname: String,
    pub surname: String,
    pub middlename: String,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub fields: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<u8>>,
}

impl Contact {
    /// Append a value under a labeled key
    pub fn push_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(key.into()).or_default().push(value.into());
    }

    /// Values stored under a key, empty if the key is absent
    pub fn values(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any `email` or `email:<type>` key is present
    pub fn has_email(&self) -> bool {
        self.fields
            .keys()
            .any(|key| key == "email" || key.starts_with("email:"))
    }

    /// Whether every name-like field is empty
    pub fn is_nameless(&self) -> bool {
        self.name.is_empty()
            && self.firstname.is_empty()
            && self.surname.is_empty()
            && self.middlename.is_empty()
    }
}

/// Per-user contact storage.
///
/// The sync pipeline only needs wholesale replacement: delete every contact of
/// a user, then insert the freshly mapped set.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Delete every stored contact of a user, returning how many were removed
    async fn delete_all(&self, user: UserId) -> Result<u64>;

    /// Insert one contact; `update` asks the backend to overwrite a matching record
    async fn insert(&self, user: UserId, contact: &Contact, update: bool) -> Result<()>;

    /// All stored contacts of a user
    async fn list(&self, user: UserId) -> Result<Vec<Contact>>;

    /// Replace a user's contacts with `contacts`, returning the inserted count.
    ///
    /// The default runs `delete_all` followed by one `insert` per contact and is
    /// not atomic: a failed insert leaves a partial set behind. Backends with
    /// transactions should override this with a staged swap.
    async fn replace_all(&self, user: UserId, contacts: &[Contact]) -> Result<usize> {
        self.delete_all(user).await?;

        let mut inserted = 0;
        for contact in contacts {
            self.insert(user, contact, false).await?;
            inserted += 1;
        }

        Ok(inserted)
    }
}
