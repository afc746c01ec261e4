//! Core data model: folders, items and wire property sets.

mod folder;
mod item;
mod property;

pub use folder::Folder;
pub use item::{Contact, Event, Item, ItemResult, Message};
pub use property::{MultiStatus, MultiStatusEntry, PropertySet};
