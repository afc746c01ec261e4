//! Folder type.

/// A mailbox folder, derived on demand from server responses.
///
/// Folders carry no identity beyond their logical path; they are never
/// cached across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folder {
    /// Logical slash-separated path, canonicalized with no trailing
    /// slash. Assigned by the namespace mapper, not the marshaller.
    pub folder_path: String,
    /// Folder class tag (mail/calendar/contacts/...).
    pub folder_class: Option<String>,
    /// True when the folder has subfolders.
    pub has_children: bool,
    /// True when the folder cannot have subfolders.
    pub no_inferiors: bool,
    /// Unread item count.
    pub unread_count: i32,
    /// Opaque content change-tag, used for sync decisions.
    pub ctag: Option<String>,
    /// Opaque entity-tag for the folder resource.
    pub etag: Option<String>,
}

impl Folder {
    /// Returns true for folders under the public-folder root.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.folder_path.starts_with("/public")
    }
}
