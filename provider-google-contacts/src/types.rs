//! Contacts feed schema
//!
//! Typed view of the parts of an Atom/GData contact entry the sync uses.
//! See: https://developers.google.com/contacts/v3/reference

/// Link relation marking a contact's photo
pub const PHOTO_REL: &str = "http://schemas.google.com/contacts/2008/rel#photo";

/// `gd:name` and its children, as found in the feed (untrimmed)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedName {
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub additional_name: Option<String>,
    pub name_prefix: Option<String>,
    pub name_suffix: Option<String>,
}

/// A typed multi-valued field (`gd:email`, `gd:phoneNumber`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedValue {
    /// Relation such as `http://schemas.google.com/g/2005#work`
    pub rel: Option<String>,
    /// Email address or phone number
    pub value: String,
}

impl FeedValue {
    /// The part of `rel` after the first `#`, if non-empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use provider_google_contacts::FeedValue;
    ///
    /// let email = FeedValue {
    ///     rel: Some("http://schemas.google.com/g/2005#home".to_string()),
    ///     value: "ada@example.org".to_string(),
    /// };
    /// assert_eq!(email.rel_type(), Some("home"));
    /// ```
    pub fn rel_type(&self) -> Option<&str> {
        self.rel
            .as_deref()
            .and_then(|rel| rel.split_once('#'))
            .map(|(_, kind)| kind)
            .filter(|kind| !kind.is_empty())
    }
}

/// An Atom `link` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedLink {
    pub rel: String,
    pub href: String,
    /// Only present on photo links that point at an actual image
    pub etag: Option<String>,
}

impl FeedLink {
    pub fn is_photo(&self) -> bool {
        self.rel == PHOTO_REL
    }
}

/// One `entry` of a group or contact feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: Option<String>,
    pub title: String,
    pub name: Option<FeedName>,
    pub emails: Vec<FeedValue>,
    pub phones: Vec<FeedValue>,
    pub links: Vec<FeedLink>,
}

/// Contact listing as returned by the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactFeed {
    /// The feed carried no `entry` element at all
    Empty,
    Entries(Vec<FeedEntry>),
}

impl ContactFeed {
    pub fn from_entries(entries: Vec<FeedEntry>) -> Self {
        if entries.is_empty() {
            ContactFeed::Empty
        } else {
            ContactFeed::Entries(entries)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ContactFeed::Empty => 0,
            ContactFeed::Entries(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
