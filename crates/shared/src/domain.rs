use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an interactable area in a town. Assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractableId(pub String);

impl InteractableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InteractableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plain snapshot of a poster session area as exchanged with the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterSessionAreaModel {
    pub id: InteractableId,
    pub title: String,
    /// Encoded image payload, usually a base64 data URL.
    pub image_contents: String,
    pub stars: u32,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
