//! Item types: messages, contacts and events.
//!
//! Items are value objects rebuilt fresh from every server response.
//! The permanent URL is the only stable identity: it survives moves,
//! while the direct href does not.

/// A mail message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Direct wire location (decoded href).
    pub href: String,
    /// Location-independent permanent URL.
    pub permanent_url: Option<String>,
    /// Entity-tag of the current version.
    pub etag: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Message size in bytes.
    pub size: i32,
    /// Internal unique id.
    pub uid: Option<String>,
    /// Alternate numeric unique id used by the IMAP front end.
    pub imap_uid: i64,
    /// Read flag.
    pub read: bool,
    /// Junk flag.
    pub junk: bool,
    /// Flagged (followup) flag.
    pub flagged: bool,
    /// Draft flag.
    pub draft: bool,
    /// Answered flag.
    pub answered: bool,
    /// Forwarded flag.
    pub forwarded: bool,
    /// Deleted flag.
    pub deleted: bool,
    /// Received date, kept as the raw server string.
    pub date: Option<String>,
}

/// An address-book contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    /// Direct wire location (decoded href).
    pub href: String,
    /// Location-independent permanent URL.
    pub permanent_url: Option<String>,
    /// Entity-tag of the current version.
    pub etag: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
}

/// A calendar event or task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Direct wire location (decoded href).
    pub href: String,
    /// Location-independent permanent URL.
    pub permanent_url: Option<String>,
    /// Entity-tag of the current version.
    pub etag: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
}

/// A non-message item, dispatched by content class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// An address-book contact.
    Contact(Contact),
    /// A calendar event or task.
    Event(Event),
}

impl Item {
    /// Returns the item's entity-tag.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::Contact(c) => c.etag.as_deref(),
            Self::Event(e) => e.etag.as_deref(),
        }
    }

    /// Returns the item's permanent URL.
    #[must_use]
    pub fn permanent_url(&self) -> Option<&str> {
        match self {
            Self::Contact(c) => c.permanent_url.as_deref(),
            Self::Event(e) => e.permanent_url.as_deref(),
        }
    }

    /// Returns the item's direct href.
    #[must_use]
    pub fn href(&self) -> &str {
        match self {
            Self::Contact(c) => &c.href,
            Self::Event(e) => &e.href,
        }
    }
}

/// Outcome of a conditional item write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemResult {
    /// Final response status (200 updated, 201 created), after vendor
    /// status renormalization.
    pub status: u16,
    /// Entity-tag of the stored version, when the server returned one.
    pub etag: Option<String>,
}
