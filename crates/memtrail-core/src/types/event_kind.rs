//! Classification of a memory mutation.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Kind of mutation a history event describes.
///
/// The store persists the event as free text, so this enum is a convenience
/// for callers. Anything longer than [`EventKind::MAX_LEN`] is rejected by the
/// table definition.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum EventKind {
    /// A memory was created.
    Add,
    /// A memory's text changed.
    Update,
    /// A memory was removed.
    Delete,
}

impl EventKind {
    /// Maximum stored length of an event string.
    pub const MAX_LEN: usize = 10;

    /// The stored representation (`ADD`, `UPDATE`, `DELETE`).
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Parse a stored event string, returning `None` for anything outside the
    /// three known kinds.
    pub fn parse(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl AsRef<str> for EventKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
