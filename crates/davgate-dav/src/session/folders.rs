//! Folder namespace mapping and folder operations.
//!
//! The mapper translates between logical slash-separated folder paths
//! and server-side URLs, both pure functions of the bootstrap state.
//! Well-known folders are matched before generic mailbox-relative
//! stripping: some well-known URLs are not lexical children of the
//! mailbox root path.

use url::Url;

use super::{
    CALENDAR, CONTACTS, DRAFTS, DavSession, INBOX, Mailbox, PUBLIC_ROOT, SENT, TRASH, encode_path,
};
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::marshal::{self, decode_href};
use crate::search::{self, Traversal};
use crate::transport::{DavRequest, Method, PropertyUpdate, Transport};
use crate::types::Folder;

/// Property aliases fetched for a single-folder read.
const FOLDER_PROPERTIES: [&str; 6] = [
    "folderclass",
    "hassubs",
    "nosubs",
    "unreadcount",
    "contenttag",
    "lastmodified",
];

impl Mailbox {
    fn well_known(&self) -> [(&'static str, Option<&str>); 6] {
        // recognition order matters: inbox before the generic rules
        [
            (INBOX, self.inbox_url.as_deref()),
            (SENT, self.sent_url.as_deref()),
            (DRAFTS, self.drafts_url.as_deref()),
            (TRASH, self.trash_url.as_deref()),
            (CALENDAR, self.calendar_url.as_deref()),
            (CONTACTS, self.contacts_url.as_deref()),
        ]
    }

    /// Maps a logical folder path to its absolute server URL.
    ///
    /// # Errors
    /// [`Error::FolderNotFound`] when the path names a well-known folder
    /// the server did not expose.
    pub fn resolve(&self, folder_path: &str) -> Result<String> {
        for (name, url) in self.well_known() {
            if let Some(rest) = folder_path.strip_prefix(name) {
                let url =
                    url.ok_or_else(|| Error::FolderNotFound(folder_path.to_string()))?;
                return Ok(format!("{url}{rest}"));
            }
        }
        if let Some(rest) = folder_path.strip_prefix(PUBLIC_ROOT) {
            return Ok(format!("{}{rest}", self.public_url));
        }
        Ok(format!("{}{folder_path}", self.mail_path))
    }

    /// Maps a decoded server href back to a logical folder path.
    ///
    /// Priority order: well-known folder prefixes, then mailbox-root
    /// substring stripping, then the raw URL path component. Exactly one
    /// trailing slash is stripped.
    #[must_use]
    pub fn classify(&self, href: &str) -> String {
        let mut path = 'path: {
            for (name, url) in self.well_known() {
                if let Some(url) = url
                    && !url.is_empty()
                    && let Some(rest) = href.strip_prefix(url)
                {
                    break 'path format!("{name}{rest}");
                }
            }
            let root = self.mail_path.strip_suffix('/').unwrap_or(&self.mail_path);
            if !root.is_empty()
                && let Some(index) = href.find(root)
            {
                if index + self.mail_path.len() > href.len() {
                    // the mailbox root itself
                    break 'path String::new();
                }
                // hrefs are decoded before classification, so the byte
                // after the root may sit inside a multi-byte character
                if let Some(rest) = href.get(index + self.mail_path.len()..) {
                    break 'path rest.to_string();
                }
            }
            match Url::parse(href) {
                Ok(url) => url.path().to_string(),
                Err(_) => href.to_string(),
            }
        };
        if path.ends_with('/') {
            path.pop();
        }
        path
    }
}

impl<T: Transport> DavSession<T> {
    /// Reads a single folder.
    ///
    /// # Errors
    /// [`Error::FolderNotFound`] when the folder does not exist.
    pub async fn get_folder(&mut self, folder_path: &str) -> Result<Folder> {
        let url = self.mailbox.resolve(folder_path)?;
        let mut props = Vec::with_capacity(FOLDER_PROPERTIES.len());
        for alias in FOLDER_PROPERTIES {
            props.push(self.fields.lookup(alias)?);
        }
        let response = self
            .transport
            .propfind(&encode_path(&url), 0, &props)
            .await
            .map_err(|e| match e {
                Error::ItemNotFound => Error::FolderNotFound(folder_path.to_string()),
                other => other,
            })?;
        let Some(entry) = response.first() else {
            return Err(Error::FolderNotFound(folder_path.to_string()));
        };
        let mut folder = marshal::build_folder(entry);
        folder.folder_path = folder_path.to_string();
        Ok(folder)
    }

    /// Lists subfolders of a folder, optionally filtered and recursive.
    ///
    /// Uses deep traversal for recursive listings, except under the
    /// public root where the server ignores deep traversal; there each
    /// discovered child is listed again manually.
    pub async fn get_sub_folders(
        &mut self,
        folder_path: &str,
        condition: Option<&Condition>,
        recursive: bool,
    ) -> Result<Vec<Folder>> {
        let is_public = folder_path.starts_with(PUBLIC_ROOT);
        let mode = if !is_public && recursive {
            Traversal::Deep
        } else {
            Traversal::Shallow
        };
        let mut folders = Vec::new();
        let mut pending = vec![folder_path.to_string()];
        while let Some(path) = pending.pop() {
            let url = self.mailbox.resolve(&path)?;
            let query = search::folder_listing(&self.fields, &url, mode, condition)?;
            let response = self.transport.search(&encode_path(&url), &query).await?;
            for entry in &response.responses {
                let mut folder = marshal::build_folder(entry);
                folder.folder_path = self.mailbox.classify(&decode_href(&entry.href));
                if is_public && recursive {
                    pending.push(folder.folder_path.clone());
                }
                folders.push(folder);
            }
        }
        Ok(folders)
    }

    /// Creates a folder carrying an initial folder class.
    ///
    /// An already-existing folder is treated as created.
    pub async fn create_folder(&mut self, folder_path: &str, folder_class: &str) -> Result<()> {
        let url = self.mailbox.resolve(folder_path)?;
        let patch = vec![PropertyUpdate::new(
            self.fields.lookup("folderclass")?.uri(),
            folder_class,
        )];
        let request = DavRequest::new(Method::MkCol, encode_path(&url)).patch(patch);
        let response = self.run(request).await?;
        // ok or already exists
        match response.status {
            207 | 405 => Ok(()),
            status => Err(Error::from_status(status, response.reason)),
        }
    }

    /// Deletes a folder. Idempotent: an already-absent folder succeeds.
    pub async fn delete_folder(&mut self, folder_path: &str) -> Result<()> {
        let url = self.mailbox.resolve(folder_path)?;
        let response = self.run(DavRequest::new(Method::Delete, encode_path(&url))).await?;
        if response.is_success() || response.status == 404 {
            Ok(())
        } else {
            Err(Error::from_status(response.status, response.reason))
        }
    }

    /// Moves or renames a folder.
    ///
    /// # Errors
    /// [`Error::PreconditionFailed`] when the target already exists.
    pub async fn move_folder(&mut self, folder_path: &str, target_path: &str) -> Result<()> {
        let source = self.mailbox.resolve(folder_path)?;
        let target = self.mailbox.resolve(target_path)?;
        let request = DavRequest::new(Method::Move, encode_path(&source))
            .header("Destination", encode_path(&target))
            .header("Overwrite", "f");
        let response = self.run(request).await?;
        match response.status {
            201 => Ok(()),
            412 => Err(Error::PreconditionFailed("unable to move folder".to_string())),
            status => Err(Error::from_status(status, response.reason)),
        }
    }
}
