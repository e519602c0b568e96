use serde::{Deserialize, Serialize};

use crate::domain::PosterSessionAreaModel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    InteractableUpdated { area: PosterSessionAreaModel },
}
