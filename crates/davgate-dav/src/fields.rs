//! Field-name to property-namespace registry.
//!
//! Every logical attribute name used by the gateway maps to exactly one
//! (namespace, local name) pair on the wire. The table is built once at
//! startup and injected into the session as a read-only value, so
//! sessions stay testable in isolation.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Property namespaces consumed by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Generic WebDAV namespace (`DAV:`).
    Dav,
    /// Vendor mail schema (`urn:schemas:httpmail:`).
    HttpMail,
    /// Mail header schema (`urn:schemas:mailheader:`).
    MailHeader,
    /// Calendar schema (`urn:schemas:calendar:`).
    Calendar,
    /// Vendor exchange extension namespace.
    Exchange,
    /// MAPI property-tag namespace.
    MapiProptag,
    /// Replication/change-tag namespace.
    Repl,
}

impl Namespace {
    /// Returns the namespace URI.
    #[must_use]
    pub const fn as_uri(self) -> &'static str {
        match self {
            Self::Dav => "DAV:",
            Self::HttpMail => "urn:schemas:httpmail:",
            Self::MailHeader => "urn:schemas:mailheader:",
            Self::Calendar => "urn:schemas:calendar:",
            Self::Exchange => "http://schemas.microsoft.com/exchange/",
            Self::MapiProptag => "http://schemas.microsoft.com/mapi/proptag/",
            Self::Repl => "http://schemas.microsoft.com/repl/",
        }
    }
}

/// A registered field: logical alias plus its wire identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Logical attribute name used by callers.
    pub alias: &'static str,
    /// Property namespace.
    pub namespace: Namespace,
    /// Local property name inside the namespace.
    pub name: &'static str,
}

impl Field {
    /// Returns the full property URI (`<namespace><name>`), the form
    /// quoted inside DASL queries.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("{}{}", self.namespace.as_uri(), self.name)
    }
}

/// Read-only mapping from logical attribute names to wire properties.
#[derive(Debug)]
pub struct FieldRegistry {
    fields: HashMap<&'static str, Field>,
}

impl FieldRegistry {
    /// Builds the registry. Call once at process start.
    #[must_use]
    pub fn new() -> Self {
        let mut fields = HashMap::new();
        let mut add = |alias: &'static str, namespace: Namespace, name: &'static str| {
            fields.insert(
                alias,
                Field {
                    alias,
                    namespace,
                    name,
                },
            );
        };

        // Well-known folder URL properties, fetched once at bootstrap.
        add("inbox", Namespace::HttpMail, "inbox");
        add("deleteditems", Namespace::HttpMail, "deleteditems");
        add("sentitems", Namespace::HttpMail, "sentitems");
        add("sendmsg", Namespace::HttpMail, "sendmsg");
        add("drafts", Namespace::HttpMail, "drafts");
        add("calendar", Namespace::HttpMail, "calendar");
        add("contacts", Namespace::HttpMail, "contacts");
        add("outbox", Namespace::HttpMail, "outbox");

        // Folder properties.
        add("folderclass", Namespace::Exchange, "outlookfolderclass");
        add("hassubs", Namespace::Dav, "hassubs");
        add("nosubs", Namespace::Dav, "nosubs");
        add("ishidden", Namespace::Dav, "ishidden");
        add("isfolder", Namespace::Dav, "isfolder");
        add("unreadcount", Namespace::HttpMail, "unreadcount");
        add("contenttag", Namespace::Repl, "contenttag");
        add("lastmodified", Namespace::Dav, "getlastmodified");
        // Folder entity-tag lives in a MAPI property, not DAV:getetag.
        add("folderetag", Namespace::MapiProptag, "x30080040");

        // Shared item properties.
        add("permanenturl", Namespace::Exchange, "permanenturl");
        add("etag", Namespace::Dav, "getetag");
        add("contentclass", Namespace::Dav, "contentclass");
        add("displayname", Namespace::Dav, "displayname");

        // Message properties.
        add("messageSize", Namespace::MapiProptag, "x0e080003");
        add("uid", Namespace::Dav, "uid");
        add("imapUid", Namespace::MapiProptag, "x0e230003");
        add("read", Namespace::HttpMail, "read");
        add("junk", Namespace::MapiProptag, "x10830003");
        add("flagStatus", Namespace::MapiProptag, "x10900003");
        add("messageFlags", Namespace::MapiProptag, "x0e070003");
        add("lastVerbExecuted", Namespace::MapiProptag, "x10810003");
        add("iconIndex", Namespace::MapiProptag, "x10800003");
        add("deleted", Namespace::MapiProptag, "x668f0040");
        add("writedeleted", Namespace::MapiProptag, "x668f0040");
        add("date", Namespace::MailHeader, "date");
        add("datereceived", Namespace::HttpMail, "datereceived");
        add("bcc", Namespace::MailHeader, "bcc");
        add("internetContent", Namespace::Exchange, "x661d0102");

        // Event properties.
        add("instancetype", Namespace::Calendar, "instancetype");

        Self { fields }
    }

    /// Resolves a logical attribute name.
    ///
    /// # Errors
    /// Returns [`Error::UnknownField`] for unregistered aliases.
    pub fn lookup(&self, alias: &str) -> Result<&Field> {
        self.fields
            .get(alias)
            .ok_or_else(|| Error::UnknownField(alias.to_string()))
    }

    /// Resolves a mail header name to its property URI.
    ///
    /// Headers live in a flat namespace keyed by the header name itself,
    /// so this lookup cannot fail.
    #[must_use]
    pub fn header_uri(name: &str) -> String {
        format!("{}{}", Namespace::MailHeader.as_uri(), name.to_lowercase())
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}
