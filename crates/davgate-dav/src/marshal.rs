//! Item marshaller: typed records from wire property sets.
//!
//! All builders are pure transformations of one multi-status entry.
//! Message flags live in string-coded properties with fixed magic
//! values; the decodings here must stay byte-compatible with the server
//! conventions (`"1"` read, `"2"` flagged, `"9"` draft, verb codes
//! `102`/`103` answered and `104` forwarded).

use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};
use crate::fields::Namespace;
use crate::types::{Contact, Event, Folder, Item, Message, MultiStatusEntry};

/// Content class marking a contact.
const CONTENT_CLASS_PERSON: &str = "urn:content-classes:person";
/// Content classes marking an event.
const CONTENT_CLASS_APPOINTMENT: &str = "urn:content-classes:appointment";
const CONTENT_CLASS_CALENDAR_MESSAGE: &str = "urn:content-classes:calendarmessage";

/// Percent-decodes a server href.
#[must_use]
pub fn decode_href(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Builds a message from an item-search entry (aliased columns).
#[must_use]
pub fn build_message(entry: &MultiStatusEntry) -> Message {
    let props = &entry.props;
    let last_verb = props.get_alias("lastVerbExecuted");
    let message = Message {
        href: decode_href(&entry.href),
        permanent_url: props.get_alias("permanenturl").map(ToOwned::to_owned),
        etag: props.get_alias("etag").map(ToOwned::to_owned),
        display_name: props.get_alias("displayname").map(ToOwned::to_owned),
        size: props.get_alias_int("messageSize"),
        uid: props.get_alias("uid").map(ToOwned::to_owned),
        imap_uid: props.get_alias_long("imapUid"),
        read: props.get_alias("read") == Some("1"),
        junk: props.get_alias("junk") == Some("1"),
        flagged: props.get_alias("flagStatus") == Some("2"),
        draft: props.get_alias("messageFlags") == Some("9"),
        answered: last_verb == Some("102") || last_verb == Some("103"),
        forwarded: last_verb == Some("104"),
        deleted: props.get_alias("deleted") == Some("1"),
        date: props.get_alias("date").map(ToOwned::to_owned),
    };
    tracing::debug!(
        href = %entry.href,
        imap_uid = message.imap_uid,
        permanent_url = ?message.permanent_url,
        "built message"
    );
    message
}

/// Reads a property that may arrive namespaced (propfind) or as an
/// aliased search column.
fn namespaced_or_alias(
    entry: &MultiStatusEntry,
    namespace: Namespace,
    name: &str,
    alias: &str,
) -> Option<String> {
    entry
        .props
        .get(namespace, name)
        .or_else(|| entry.props.get_alias(alias))
        .map(ToOwned::to_owned)
}

/// Builds a contact from a propfind or search entry.
#[must_use]
pub fn build_contact(entry: &MultiStatusEntry) -> Contact {
    Contact {
        href: decode_href(&entry.href),
        permanent_url: namespaced_or_alias(entry, Namespace::Exchange, "permanenturl", "permanenturl"),
        etag: namespaced_or_alias(entry, Namespace::Dav, "getetag", "etag"),
        display_name: namespaced_or_alias(entry, Namespace::Dav, "displayname", "displayname"),
    }
}

/// Builds an event from a propfind or search entry.
#[must_use]
pub fn build_event(entry: &MultiStatusEntry) -> Event {
    Event {
        href: decode_href(&entry.href),
        permanent_url: namespaced_or_alias(entry, Namespace::Exchange, "permanenturl", "permanenturl"),
        etag: namespaced_or_alias(entry, Namespace::Dav, "getetag", "etag"),
        display_name: namespaced_or_alias(entry, Namespace::Dav, "displayname", "displayname"),
    }
}

/// Builds a folder record from a propfind or folder-search entry.
///
/// The logical path is left empty: placing the folder in the namespace
/// is the mapper's job, done after marshalling.
#[must_use]
pub fn build_folder(entry: &MultiStatusEntry) -> Folder {
    let props = &entry.props;
    Folder {
        folder_path: String::new(),
        folder_class: props.get_string(Namespace::Exchange, "outlookfolderclass"),
        has_children: props.get(Namespace::Dav, "hassubs") == Some("1"),
        no_inferiors: props.get(Namespace::Dav, "nosubs") == Some("1"),
        unread_count: props.get_int(Namespace::HttpMail, "unreadcount"),
        ctag: props.get_string(Namespace::Repl, "contenttag"),
        etag: props.get_string(Namespace::MapiProptag, "x30080040"),
    }
}

/// Dispatches a propfind entry into a typed item by content class.
///
/// # Errors
/// [`Error::ItemNotFound`] when the content class is missing or not a
/// recognized contact/event class.
pub fn classify_item(entry: &MultiStatusEntry) -> Result<Item> {
    match entry.props.get(Namespace::Dav, "contentclass") {
        Some(CONTENT_CLASS_PERSON) => Ok(Item::Contact(build_contact(entry))),
        Some(CONTENT_CLASS_APPOINTMENT | CONTENT_CLASS_CALENDAR_MESSAGE) => {
            Ok(Item::Event(build_event(entry)))
        }
        _ => Err(Error::ItemNotFound),
    }
}
