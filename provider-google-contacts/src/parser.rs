//! Streaming parser for Atom/GData feeds
//!
//! Walks the document with `quick-xml`'s namespace-aware reader and collects
//! the direct `entry` children of the root element into [`FeedEntry`] values.
//! Elements are matched on their resolved namespace and local name, so the
//! GData namespace may be bound to any prefix. Attributes are matched on their
//! local name only.

use crate::error::{FeedError, Result};
use crate::types::{FeedEntry, FeedLink, FeedName, FeedValue};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const GDATA_NS: &[u8] = b"http://schemas.google.com/g/2005";

/// Parse every `entry` of a feed document.
///
/// # Examples
///
/// ```
/// use provider_google_contacts::parse_feed;
///
/// let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
///   <entry><id>group-1</id><title>My Contacts</title></entry>
/// </feed>"#;
///
/// let entries = parse_feed(xml).unwrap();
/// assert_eq!(entries[0].id.as_deref(), Some("group-1"));
/// ```
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = NsReader::from_str(xml);
    let mut parser = FeedParser::default();

    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok((resolved, event)) => (Ns::of(&resolved), event),
            Err(e) => {
                return Err(FeedError::Parse(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        };

        match event {
            Event::Start(element) => {
                let parent = parser.depth;
                parser.depth += 1;
                parser.open(&element, ns, parent)?;
            }
            Event::Empty(element) => {
                let parent = parser.depth;
                parser.open(&element, ns, parent)?;
                parser.close(ns, element.local_name().as_ref(), parent);
            }
            Event::End(element) => {
                parser.depth = parser.depth.saturating_sub(1);
                let parent = parser.depth;
                parser.close(ns, element.local_name().as_ref(), parent);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| FeedError::Parse(format!("bad text content: {}", e)))?;
                parser.append_text(&text);
            }
            Event::CData(data) => {
                parser.append_text(&String::from_utf8_lossy(&data.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parser.entries)
}

/// Namespace an element resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    /// Atom, or no namespace at all
    Atom,
    GData,
    Other,
}

impl Ns {
    fn of(resolved: &ResolveResult<'_>) -> Self {
        match resolved {
            ResolveResult::Unbound => Ns::Atom,
            ResolveResult::Bound(Namespace(uri)) if *uri == ATOM_NS => Ns::Atom,
            ResolveResult::Bound(Namespace(uri)) if *uri == GDATA_NS => Ns::GData,
            // Undeclared `gd:` prefix, seen in hand-built feeds
            ResolveResult::Unknown(prefix) if prefix.as_slice() == b"gd" => Ns::GData,
            _ => Ns::Other,
        }
    }
}

/// Text-bearing element currently being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    FullName,
    GivenName,
    FamilyName,
    AdditionalName,
    NamePrefix,
    NameSuffix,
    PhoneNumber,
}

#[derive(Default)]
struct FeedParser {
    depth: usize,
    /// Entry being built and the depth of its `entry` element
    entry: Option<(usize, FeedEntry)>,
    in_name: bool,
    /// Field, depth of its element, collected text
    capture: Option<(Field, usize, String)>,
    entries: Vec<FeedEntry>,
}

impl FeedParser {
    fn open(&mut self, element: &BytesStart<'_>, ns: Ns, parent: usize) -> Result<()> {
        let local = element.local_name();
        let local = local.as_ref();

        if self.entry.is_none() {
            // Entries are direct children of the root element
            if ns == Ns::Atom && local == b"entry" && parent == 1 {
                self.entry = Some((parent + 1, FeedEntry::default()));
            }
            return Ok(());
        }
        let Some((entry_depth, entry)) = self.entry.as_mut() else {
            return Ok(());
        };
        let entry_depth = *entry_depth;

        if parent == entry_depth {
            match (ns, local) {
                (Ns::Atom, b"id") => self.capture = Some((Field::Id, parent + 1, String::new())),
                (Ns::Atom, b"title") => {
                    self.capture = Some((Field::Title, parent + 1, String::new()))
                }
                (Ns::GData, b"name") => {
                    self.in_name = true;
                    entry.name.get_or_insert_with(FeedName::default);
                }
                (Ns::GData, b"email") => entry.emails.push(FeedValue {
                    rel: attribute(element, b"rel")?,
                    value: attribute(element, b"address")?.unwrap_or_default(),
                }),
                (Ns::GData, b"phoneNumber") => {
                    entry.phones.push(FeedValue {
                        rel: attribute(element, b"rel")?,
                        value: String::new(),
                    });
                    self.capture = Some((Field::PhoneNumber, parent + 1, String::new()));
                }
                (Ns::Atom, b"link") => entry.links.push(FeedLink {
                    rel: attribute(element, b"rel")?.unwrap_or_default(),
                    href: attribute(element, b"href")?.unwrap_or_default(),
                    etag: attribute(element, b"etag")?,
                }),
                _ => {}
            }
        } else if self.in_name && ns == Ns::GData && parent == entry_depth + 1 {
            let field = match local {
                b"fullName" => Field::FullName,
                b"givenName" => Field::GivenName,
                b"familyName" => Field::FamilyName,
                b"additionalName" => Field::AdditionalName,
                b"namePrefix" => Field::NamePrefix,
                b"nameSuffix" => Field::NameSuffix,
                _ => return Ok(()),
            };
            self.capture = Some((field, parent + 1, String::new()));
        }

        Ok(())
    }

    fn append_text(&mut self, text: &str) {
        if let Some((_, _, buffer)) = self.capture.as_mut() {
            buffer.push_str(text);
        }
    }

    fn close(&mut self, ns: Ns, local: &[u8], parent: usize) {
        if matches!(self.capture, Some((_, depth, _)) if depth == parent + 1) {
            if let Some((field, _, text)) = self.capture.take() {
                self.store(field, text);
            }
        }

        let Some((entry_depth, _)) = self.entry.as_ref() else {
            return;
        };
        let entry_depth = *entry_depth;

        if ns == Ns::GData && local == b"name" && parent == entry_depth {
            self.in_name = false;
        } else if ns == Ns::Atom && local == b"entry" && parent + 1 == entry_depth {
            if let Some((_, entry)) = self.entry.take() {
                self.entries.push(entry);
            }
            self.in_name = false;
        }
    }

    fn store(&mut self, field: Field, text: String) {
        let Some((_, entry)) = self.entry.as_mut() else {
            return;
        };

        match field {
            Field::Id => entry.id = Some(text.trim().to_string()),
            Field::Title => entry.title = text,
            Field::PhoneNumber => {
                if let Some(phone) = entry.phones.last_mut() {
                    phone.value = text;
                }
            }
            name_field => {
                let name = entry.name.get_or_insert_with(FeedName::default);
                let slot = match name_field {
                    Field::FullName => &mut name.full_name,
                    Field::GivenName => &mut name.given_name,
                    Field::FamilyName => &mut name.family_name,
                    Field::AdditionalName => &mut name.additional_name,
                    Field::NamePrefix => &mut name.name_prefix,
                    _ => &mut name.name_suffix,
                };
                *slot = Some(text);
            }
        }
    }
}

/// First attribute whose local name is `key`, whatever its prefix.
fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| FeedError::Parse(format!("bad attribute: {}", e)))?;
        if attr.key.local_name().as_ref() != key {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| FeedError::Parse(format!("bad attribute value: {}", e)))?;
        return Ok(Some(value.into_owned()));
    }
    Ok(None)
}
