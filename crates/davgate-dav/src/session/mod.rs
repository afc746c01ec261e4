//! WebDAV mailbox session.
//!
//! A [`DavSession`] wraps an authenticated transport and the session
//! state discovered at bootstrap (mailbox root path, user email and the
//! well-known folder URLs). One session serves exactly one client
//! connection and is driven strictly sequentially; the only shared data
//! across sessions is the read-only field registry.

mod bootstrap;
mod crud;
mod folders;

use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::error::{Error, Result};
use crate::fields::FieldRegistry;
use crate::transport::{DavRequest, DavResponse, Transport};

pub use crud::ItemProperty;

/// Logical name of the inbox folder.
pub const INBOX: &str = "INBOX";
/// Logical name of the sent-items folder.
pub const SENT: &str = "SENT";
/// Logical name of the drafts folder.
pub const DRAFTS: &str = "DRAFTS";
/// Logical name of the trash folder.
pub const TRASH: &str = "TRASH";
/// Logical name of the calendar folder.
pub const CALENDAR: &str = "CALENDAR";
/// Logical name of the contacts folder.
pub const CONTACTS: &str = "CONTACTS";
/// Default public-folder root path.
pub const PUBLIC_ROOT: &str = "/public";

/// Feature flags consumed by the session. Owned by the gateway
/// configuration, not by this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    /// After a successful item write, patch metadata to trigger a push
    /// notification and re-fetch the entity-tag.
    pub force_push_update: bool,
    /// Best-effort delete items whose body can no longer be read.
    pub delete_broken: bool,
}

/// Immutable session state discovered at bootstrap.
///
/// Well-known URLs are stored percent-decoded. A missing URL means the
/// server did not expose that folder over WebDAV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mailbox {
    /// User email address derived from the authenticated context.
    pub email: String,
    /// Mailbox root path, with trailing slash.
    pub mail_path: String,
    /// Inbox URL.
    pub inbox_url: Option<String>,
    /// Trash (deleted items) URL.
    pub trash_url: Option<String>,
    /// Sent items URL.
    pub sent_url: Option<String>,
    /// Send-queue URL; moving a message here submits it.
    pub sendmsg_url: Option<String>,
    /// Drafts URL.
    pub drafts_url: Option<String>,
    /// Calendar URL.
    pub calendar_url: Option<String>,
    /// Contacts URL.
    pub contacts_url: Option<String>,
    /// Outbox URL.
    pub outbox_url: Option<String>,
    /// Public-folder root URL, or the default path when public folders
    /// are unavailable.
    pub public_url: String,
}

/// An authenticated WebDAV mailbox session.
#[derive(Debug)]
pub struct DavSession<T: Transport> {
    transport: T,
    fields: Arc<FieldRegistry>,
    config: SessionConfig,
    mailbox: Mailbox,
}

impl<T: Transport> DavSession<T> {
    /// Opens a session: discovers the mailbox root from the post-login
    /// landing page, resolves the well-known folder URLs and probes the
    /// public-folder root.
    ///
    /// # Errors
    /// [`Error::Authentication`] when identity cannot be established,
    /// [`Error::MailboxDiscovery`] when the well-known folders are
    /// unreachable.
    pub async fn open(
        mut transport: T,
        landing_body: &[u8],
        fields: Arc<FieldRegistry>,
        config: SessionConfig,
    ) -> Result<Self> {
        let mailbox = bootstrap::bootstrap(&mut transport, landing_body, &fields).await?;
        Ok(Self {
            transport,
            fields,
            config,
            mailbox,
        })
    }

    /// Returns the immutable session state.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Returns the user email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.mailbox.email
    }

    /// Returns the field registry in use.
    #[must_use]
    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    /// Checks whether the session credentials are still valid by
    /// probing the inbox. Network-level failures propagate; any other
    /// failure signals an expired session.
    ///
    /// # Errors
    /// Only I/O failures from the transport.
    pub async fn is_expired(&mut self) -> Result<bool> {
        let Some(inbox_url) = self.mailbox.inbox_url.clone() else {
            return Ok(true);
        };
        let display_name = self.fields.lookup("displayname")?;
        match self
            .transport
            .propfind(&encode_path(&inbox_url), 0, &[display_name])
            .await
        {
            Ok(_) => Ok(false),
            Err(Error::Io(e)) => Err(Error::Io(e)),
            Err(_) => Ok(true),
        }
    }

    pub(crate) async fn run(&mut self, request: DavRequest) -> Result<DavResponse> {
        self.transport.execute(request).await
    }
}

/// Characters percent-encoded inside URL paths.
const PATH_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'[')
    .add(b']')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// Percent-encodes a decoded URL path for the wire.
#[must_use]
pub(crate) fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ENCODE).to_string()
}

/// Generates a random destination name for move/copy/send temporaries.
pub(crate) fn random_item_name() -> String {
    format!("{:032x}", rand::random::<u128>())
}
