//! Item CRUD orchestration.
//!
//! Each operation is a self-contained sequence of transport requests
//! with its own retry and failover points; nothing here outlives a
//! single call. Conditional writes use `If-Match`/`If-None-Match`,
//! moves and copies permit server-side rename on name conflicts, and
//! body reads are gzip-transparent.

use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use flate2::read::GzDecoder;

use super::{DRAFTS, DavSession, TRASH, encode_path, random_item_name};
use crate::condition::{self, Condition};
use crate::error::{Error, Result};
use crate::fields::FieldRegistry;
use crate::marshal;
use crate::search;
use crate::transport::{DavRequest, Method, PropertyUpdate, Transport};
use crate::types::{Contact, Event, Item, ItemResult, Message, MultiStatus};

/// Property aliases fetched for a single-item read.
const ITEM_PROPERTIES: [&str; 4] = ["permanenturl", "etag", "contentclass", "displayname"];

/// A logical property assignment carried on message create/update.
///
/// Names are the logical flag names (`read`, `flagged`, `draft`,
/// `answered`, `forwarded`, `junk`, `deleted`, `bcc`, `datereceived`);
/// values are the wire string codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProperty {
    /// Logical property name.
    pub name: String,
    /// Wire value.
    pub value: String,
}

impl ItemProperty {
    /// Creates a property assignment.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Maps logical message properties to wire property updates.
///
/// Unrecognized names are skipped. Setting `answered`/`forwarded` also
/// writes the matching icon index so clients render the right glyph.
fn build_property_updates(
    fields: &FieldRegistry,
    properties: &[ItemProperty],
) -> Result<Vec<PropertyUpdate>> {
    let mut updates = Vec::new();
    let mut push = |alias: &str, value: &str| -> Result<()> {
        updates.push(PropertyUpdate::new(fields.lookup(alias)?.uri(), value));
        Ok(())
    };
    for property in properties {
        let value = property.value.as_str();
        match property.name.as_str() {
            "read" => push("read", value)?,
            "junk" => push("junk", value)?,
            "flagged" => push("flagStatus", value)?,
            "answered" => {
                push("lastVerbExecuted", value)?;
                if value == "102" {
                    push("iconIndex", "261")?;
                }
            }
            "forwarded" => {
                push("lastVerbExecuted", value)?;
                if value == "104" {
                    push("iconIndex", "262")?;
                }
            }
            "bcc" => push("bcc", value)?,
            "draft" => push("messageFlags", value)?,
            "deleted" => push("writedeleted", value)?,
            "datereceived" => push("datereceived", value)?,
            _ => {}
        }
    }
    Ok(updates)
}

/// Converts a logical item name to its stored form.
fn item_name_to_eml(item_name: &str) -> String {
    item_name.strip_suffix(".ics").map_or_else(
        || item_name.to_string(),
        |stem| format!("{stem}.EML"),
    )
}

/// Undoes server-side character escaping in an item name before a
/// display-name search.
fn unescape_item_name(item_name: &str) -> String {
    item_name
        .replace("_xF8FF_", "/")
        .replace("_x003F_", "?")
        .replace('\'', "''")
}

impl<T: Transport> DavSession<T> {
    /// Conditionally writes an item body at the given URL.
    ///
    /// `etag` makes the write an update guarded by `If-Match`;
    /// `none_match` guards a create with `If-None-Match`. The returned
    /// status is 200 for an update and 201 for a create; other statuses
    /// are reported in the result, not raised. When the push-update flag
    /// is on, a successful write is followed by a metadata patch and an
    /// entity-tag re-fetch.
    pub async fn create_or_update_item(
        &mut self,
        item_url: &str,
        content_class: &str,
        body: &[u8],
        etag: Option<&str>,
        none_match: Option<&str>,
    ) -> Result<ItemResult> {
        let mut request = DavRequest::new(Method::Put, encode_path(item_url))
            .header("Translate", "f")
            .header("Overwrite", "f");
        if let Some(etag) = etag {
            request = request.header("If-Match", etag);
        }
        if let Some(none_match) = none_match {
            request = request.header("If-None-Match", none_match);
        }
        let request = request
            .header("Content-Type", "message/rfc822")
            .body(body.to_vec());
        let response = self.run(request).await?;

        match response.status {
            200 => {
                if etag.is_some() {
                    tracing::debug!(url = %item_url, "updated item");
                } else {
                    tracing::warn!(url = %item_url, "overwritten item");
                }
            }
            201 => {}
            status => tracing::warn!(
                status,
                reason = %response.reason,
                "unable to create or update item"
            ),
        }

        let mut result = ItemResult {
            status: response.status,
            etag: response.header("GetETag").map(ToOwned::to_owned),
        };

        // trigger a push notification on the written item, only when
        // the gateway configuration asks for it
        if matches!(result.status, 200 | 201) && self.config.force_push_update {
            let patch = vec![
                PropertyUpdate::new(self.fields.lookup("contentclass")?.uri(), content_class),
                PropertyUpdate::new(
                    self.fields.lookup("internetContent")?.uri(),
                    BASE64.encode(body),
                ),
            ];
            let patch_request =
                DavRequest::new(Method::PropPatch, encode_path(item_url)).patch(patch);
            let patch_response = self.run(patch_request).await?;
            if patch_response.status == 207 {
                // the patch may have changed the entity-tag
                let item = self.get_item_by_url(item_url).await?;
                result.etag = item.etag().map(ToOwned::to_owned);
            } else {
                tracing::warn!(url = %item_url, "unable to patch item to trigger push update");
            }
        }
        Ok(result)
    }

    /// Reads an item by URL and dispatches it by content class.
    ///
    /// # Errors
    /// [`Error::ItemNotFound`] when the resource is absent or not a
    /// contact/event.
    pub async fn get_item_by_url(&mut self, item_url: &str) -> Result<Item> {
        let mut props = Vec::with_capacity(ITEM_PROPERTIES.len());
        for alias in ITEM_PROPERTIES {
            props.push(self.fields.lookup(alias)?);
        }
        let response = self
            .transport
            .propfind(&encode_path(item_url), 0, &props)
            .await?;
        let entry = response.first().ok_or(Error::ItemNotFound)?;
        marshal::classify_item(entry)
    }

    /// Looks up an item by logical name inside a folder.
    ///
    /// Tries the direct path first; on not-found, falls back to a
    /// display-name search after undoing server-side name escaping and
    /// follows the first match's permanent URL.
    pub async fn get_item(&mut self, folder_path: &str, item_name: &str) -> Result<Item> {
        let stored_name = item_name_to_eml(item_name);
        let item_url = format!("{}/{stored_name}", self.mailbox.resolve(folder_path)?);
        match self.get_item_by_url(&item_url).await {
            Ok(item) => Ok(item),
            Err(not_found) if not_found.is_not_found() => {
                let decoded_name = unescape_item_name(&stored_name);
                tracing::debug!(
                    url = %item_url,
                    name = %decoded_name,
                    "item not found, searching by display name"
                );
                let matches = self
                    .search_messages(
                        folder_path,
                        &[],
                        Some(&condition::eq("displayname", decoded_name)),
                    )
                    .await?;
                match matches.first().and_then(|m| m.permanent_url.clone()) {
                    Some(permanent_url) => self.get_item_by_url(&permanent_url).await,
                    None => Err(not_found),
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Creates a message in a folder.
    ///
    /// When draft-marking properties are present, the draft flags are
    /// patched onto the not-yet-existing resource before the body is
    /// written; remaining properties (blind carbon copy among them) are
    /// patched afterwards.
    pub async fn create_message(
        &mut self,
        folder_path: &str,
        message_name: &str,
        properties: &[ItemProperty],
        body: &[u8],
    ) -> Result<()> {
        let message_url = format!("{}/{message_name}.EML", self.mailbox.resolve(folder_path)?);
        let encoded_url = encode_path(&message_url);

        // the draft flag must exist before the body does
        if properties.iter().any(|p| p.name == "draft") {
            let patch = build_property_updates(&self.fields, properties)?;
            let request = DavRequest::new(Method::PropPatch, encoded_url.clone()).patch(patch);
            let response = self.run(request).await?;
            if response.status != 207 {
                return Err(Error::Transport {
                    status: response.status,
                    reason: format!("unable to create message {message_url}: {}", response.reason),
                });
            }
        }

        let request = DavRequest::new(Method::Put, encoded_url.clone())
            .header("Translate", "f")
            .body(body.to_vec());
        let response = self.run(request).await?;
        if !matches!(response.status, 200 | 201) {
            return Err(Error::Transport {
                status: response.status,
                reason: format!("unable to create message {message_url}: {}", response.reason),
            });
        }

        if !properties.is_empty() {
            let patch = build_property_updates(&self.fields, properties)?;
            let request = DavRequest::new(Method::PropPatch, encoded_url).patch(patch);
            let response = self.run(request).await?;
            if response.status != 207 {
                return Err(Error::Transport {
                    status: response.status,
                    reason: format!("unable to patch message {message_url}: {}", response.reason),
                });
            }
        }
        Ok(())
    }

    /// Updates message properties in place, addressed by permanent URL.
    pub async fn update_message(
        &mut self,
        message: &Message,
        properties: &[ItemProperty],
    ) -> Result<()> {
        let url = message.permanent_url.as_deref().unwrap_or(&message.href);
        let patch = build_property_updates(&self.fields, properties)?;
        // response body parsing suppressed: sometimes invalid XML with
        // vendor property names
        let request = DavRequest::new(Method::PropPatch, encode_path(url))
            .patch(patch)
            .skip_response_body();
        let response = self.run(request).await?;
        if response.status == 207 {
            Ok(())
        } else {
            Err(Error::Transport {
                status: response.status,
                reason: format!("unable to update message: {}", response.reason),
            })
        }
    }

    /// Deletes a message by permanent URL. Idempotent.
    pub async fn delete_message(&mut self, message: &Message) -> Result<()> {
        let url = message.permanent_url.as_deref().unwrap_or(&message.href);
        tracing::debug!(permanent_url = %url, href = %message.href, "deleting message");
        let response = self.run(DavRequest::new(Method::Delete, encode_path(url))).await?;
        if response.is_success() || response.status == 404 {
            Ok(())
        } else {
            Err(Error::from_status(response.status, response.reason))
        }
    }

    /// Sends a message: creates it under drafts, then moves it to the
    /// send queue.
    pub async fn send_message(&mut self, properties: &[ItemProperty], body: &[u8]) -> Result<()> {
        let message_name = random_item_name();
        self.create_message(DRAFTS, &message_name, properties, body).await?;

        let drafts_url = self
            .mailbox
            .drafts_url
            .clone()
            .ok_or_else(|| Error::FolderNotFound(DRAFTS.to_string()))?;
        let sendmsg_url = self
            .mailbox
            .sendmsg_url
            .clone()
            .ok_or_else(|| Error::FolderNotFound("send queue".to_string()))?;
        let temp_url = format!("{drafts_url}/{message_name}.EML");
        let request = DavRequest::new(Method::Move, encode_path(&temp_url))
            .header("Destination", encode_path(&sendmsg_url))
            .header("Overwrite", "t");
        let response = self.run(request).await?;
        if response.status == 200 {
            Ok(())
        } else {
            Err(Error::from_status(response.status, response.reason))
        }
    }

    /// Moves a message to the trash folder under a random name,
    /// permitting server-side rename on conflict.
    ///
    /// A message already gone from the server counts as moved. Returns
    /// the final destination, taken from the server's `Location` header
    /// when present.
    pub async fn move_to_trash(&mut self, message: &Message) -> Result<String> {
        let trash_url = self
            .mailbox
            .trash_url
            .clone()
            .ok_or_else(|| Error::FolderNotFound(TRASH.to_string()))?;
        let mut destination = format!("{trash_url}/{}", random_item_name());
        let url = message.permanent_url.as_deref().unwrap_or(&message.href);
        tracing::debug!(from = %url, to = %destination, "moving message to trash");

        let request = DavRequest::new(Method::Move, encode_path(url))
            .header("Destination", encode_path(&destination))
            .header("Overwrite", "f")
            .header("Allow-Rename", "t");
        let response = self.run(request).await?;
        // do not fail if already deleted
        if !matches!(response.status, 201 | 404) {
            return Err(Error::from_status(response.status, response.reason));
        }
        if let Some(location) = response.header("Location") {
            destination = location.to_string();
        }
        tracing::debug!(destination = %destination, "moved to trash");
        Ok(destination)
    }

    /// Copies a message into a target folder under a random name,
    /// permitting server-side rename on conflict.
    ///
    /// # Errors
    /// [`Error::CopyConflict`] on a precondition failure.
    pub async fn copy_message(&mut self, message: &Message, target_folder: &str) -> Result<()> {
        let target = format!(
            "{}/{}",
            self.mailbox.resolve(target_folder)?,
            random_item_name()
        );
        let url = message.permanent_url.as_deref().unwrap_or(&message.href);
        let request = DavRequest::new(Method::Copy, encode_path(url))
            .header("Destination", encode_path(&target))
            .header("Overwrite", "f")
            .header("Allow-Rename", "t");
        let response = self.run(request).await?;
        match response.status {
            201 => Ok(()),
            412 => Err(Error::CopyConflict("unable to copy message".to_string())),
            status => Err(Error::from_status(status, response.reason)),
        }
    }

    /// Reads a message body, transparently decoding gzip.
    ///
    /// Tries the direct URL first and falls back to the permanent URL
    /// on not-found. When the body is gone for good and the
    /// delete-broken flag is on, the item is best-effort deleted.
    pub async fn get_content(&mut self, message: &Message) -> Result<Bytes> {
        match self.fetch_body(&message.href).await {
            Ok(body) => Ok(body),
            Err(Error::ItemNotFound) => {
                tracing::debug!(
                    href = %message.href,
                    "message not found, retrying with permanent url"
                );
                let fallback = match message.permanent_url.as_deref() {
                    Some(permanent_url) => self.fetch_body(permanent_url).await,
                    None => Err(Error::ItemNotFound),
                };
                match fallback {
                    Ok(body) => Ok(body),
                    Err(err) => {
                        tracing::warn!(href = %message.href, "unable to retrieve message");
                        if self.config.delete_broken && matches!(err, Error::ItemNotFound) {
                            tracing::warn!(href = %message.href, "deleting broken message");
                            if let Err(delete_err) = self.delete_message(message).await {
                                tracing::warn!(
                                    error = %delete_err,
                                    href = %message.href,
                                    "unable to delete broken message"
                                );
                            }
                        }
                        Err(err)
                    }
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Searches messages in a folder, sorted by IMAP uid.
    pub async fn search_messages(
        &mut self,
        folder_path: &str,
        attributes: &[&str],
        condition: Option<&Condition>,
    ) -> Result<Vec<Message>> {
        let response = self.search_items(folder_path, attributes, condition).await?;
        let mut messages: Vec<Message> =
            response.responses.iter().map(marshal::build_message).collect();
        messages.sort_by_key(|m| m.imap_uid);
        Ok(messages)
    }

    /// Searches contacts in a folder.
    pub async fn search_contacts(
        &mut self,
        folder_path: &str,
        attributes: &[&str],
        condition: Option<&Condition>,
    ) -> Result<Vec<Contact>> {
        let response = self.search_items(folder_path, attributes, condition).await?;
        Ok(response.responses.iter().map(marshal::build_contact).collect())
    }

    /// Searches events in a folder.
    ///
    /// Entries without an instance type are validated by fetching their
    /// body; invalid ones are dropped with a warning.
    pub async fn search_events(
        &mut self,
        folder_path: &str,
        attributes: &[&str],
        condition: Option<&Condition>,
    ) -> Result<Vec<Event>> {
        let response = self.search_items(folder_path, attributes, condition).await?;
        let mut events = Vec::new();
        for entry in &response.responses {
            let has_instance_type = entry.props.get_alias("instancetype").is_some();
            let event = marshal::build_event(entry);
            if has_instance_type {
                events.push(event);
                continue;
            }
            let url = event
                .permanent_url
                .clone()
                .unwrap_or_else(|| event.href.clone());
            match self.fetch_body(&url).await {
                Ok(_) => events.push(event),
                Err(err) => tracing::warn!(
                    href = %event.href,
                    error = %err,
                    "invalid event excluded from list"
                ),
            }
        }
        Ok(events)
    }

    /// Runs an item search in a folder and returns the raw entries.
    pub async fn search_items(
        &mut self,
        folder_path: &str,
        attributes: &[&str],
        condition: Option<&Condition>,
    ) -> Result<MultiStatus> {
        let folder_url = self.mailbox.resolve(folder_path)?;
        let query = search::item_listing(&self.fields, &folder_url, attributes, condition)?;
        tracing::debug!(query = %query, "search query");
        self.transport.search(&encode_path(&folder_url), &query).await
    }

    async fn fetch_body(&mut self, url: &str) -> Result<Bytes> {
        let request = DavRequest::new(Method::Get, encode_path(url))
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("Translate", "f")
            .header("Accept-Encoding", "gzip");
        let response = self.run(request).await?;
        if !response.is_success() {
            return Err(Error::from_status(response.status, response.reason));
        }
        if response.is_gzip_encoded() {
            let mut decoder = GzDecoder::new(response.body.as_ref());
            let mut decoded = Vec::new();
            decoder.read_to_end(&mut decoded)?;
            Ok(Bytes::from(decoded))
        } else {
            Ok(response.body)
        }
    }
}
