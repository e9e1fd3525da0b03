use serde::{Deserialize, Serialize};

/// Output capability requested from the remote model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Image,
    Text,
}
