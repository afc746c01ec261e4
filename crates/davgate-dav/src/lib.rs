//! # davgate-dav
//!
//! A WebDAV/DASL mailbox session layer for legacy Exchange-style
//! servers, translating logical mail operations (folder listing,
//! message CRUD, send, search) into WebDAV requests.
//!
//! ## Features
//!
//! - **Mailbox bootstrap**: Discovers the mailbox root from the
//!   post-login landing page and resolves the well-known folder URLs
//!   in a single PROPFIND
//! - **DASL search**: SQL-like folder and item queries built from a
//!   typed condition tree
//! - **Typed items**: Messages, contacts and events marshalled from
//!   multi-status property sets, including the string-coded flag
//!   conventions
//! - **Conditional writes**: Entity-tag guarded create/update, rename-
//!   tolerant move and copy, gzip-transparent body reads
//! - **Server quirks handling**: Vendor status renormalization and a
//!   one-shot fallback-authentication retry for the public-folder root
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use davgate_dav::{DavSession, FieldRegistry, SessionConfig, INBOX};
//!
//! #[tokio::main]
//! async fn main() -> davgate_dav::Result<()> {
//!     // `transport` is any authenticated `Transport` implementation;
//!     // `landing` is the post-login landing page body.
//!     let fields = Arc::new(FieldRegistry::new());
//!     let mut session =
//!         DavSession::open(transport, &landing, fields, SessionConfig::default()).await?;
//!
//!     let inbox = session.get_folder(INBOX).await?;
//!     println!("unread: {}", inbox.unread_count);
//!
//!     for message in session.search_messages(INBOX, &[], None).await? {
//!         let body = session.get_content(&message).await?;
//!         println!("{} ({} bytes)", message.href, body.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`condition`]: Search condition tree and DASL compiler
//! - [`fields`]: Logical-to-wire property field registry
//! - [`marshal`]: Typed records from wire property sets
//! - [`search`]: DASL query builders
//! - [`session`]: Session bootstrap, folder mapping and item CRUD
//! - [`transport`]: Transport abstraction and request/response types
//! - [`types`]: Core data types (folders, messages, property sets)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod condition;
mod error;
pub mod fields;
pub mod marshal;
pub mod search;
pub mod session;
pub mod transport;
pub mod types;

pub use condition::{Condition, MultiOp, Operator};
pub use error::{Error, Result};
pub use fields::{Field, FieldRegistry, Namespace};
pub use search::Traversal;
pub use session::{
    CALENDAR, CONTACTS, DRAFTS, DavSession, INBOX, ItemProperty, Mailbox, PUBLIC_ROOT, SENT,
    SessionConfig, TRASH,
};
pub use transport::{DavRequest, DavResponse, Method, PropertyUpdate, Transport};
pub use types::{
    Contact, Event, Folder, Item, ItemResult, Message, MultiStatus, MultiStatusEntry, PropertySet,
};
