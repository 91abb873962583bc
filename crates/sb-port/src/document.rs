use std::collections::BTreeMap;

use sb_snapshot::Snapshot;
use sb_types::StorageKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{PortError, PortResult};

/// One bundled blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortableFile {
    pub name: String,
    /// `data:<media type>;base64,<payload>`
    #[serde(rename = "inlineContent", alias = "dataUrl")]
    pub inline_content: String,
}

/// A snapshot plus the content of its library.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortableDocument {
    pub state: Snapshot,
    #[serde(default)]
    pub files: BTreeMap<StorageKey, PortableFile>,
    /// Keys of `files` entries that could not be read at parse time.
    #[serde(skip)]
    pub rejected: Vec<String>,
}

impl PortableDocument {
    /// Parse a document.
    ///
    /// Fails with [`PortError::Malformed`] unless `state` is present and
    /// parses as a snapshot. A malformed entry in `files` is logged and
    /// recorded in `rejected`; the rest of the document still loads.
    pub fn from_json(text: &str) -> PortResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| PortError::Malformed(e.to_string()))?;
        let Value::Object(mut root) = value else {
            return Err(PortError::Malformed("document is not an object".into()));
        };

        let state = match root.remove("state") {
            None | Some(Value::Null) => {
                return Err(PortError::Malformed("missing `state`".into()));
            }
            Some(state) => Snapshot::from_value(state)
                .map_err(|e| PortError::Malformed(format!("invalid `state`: {e}")))?,
        };

        let mut files = BTreeMap::new();
        let mut rejected = Vec::new();
        match root.remove("files") {
            None | Some(Value::Null) => {}
            Some(Value::Object(entries)) => {
                for (raw_key, entry) in entries {
                    let parsed = StorageKey::new(raw_key.clone())
                        .map_err(|e| e.to_string())
                        .and_then(|key| {
                            serde_json::from_value::<PortableFile>(entry)
                                .map(|file| (key, file))
                                .map_err(|e| e.to_string())
                        });
                    match parsed {
                        Ok((key, file)) => {
                            files.insert(key, file);
                        }
                        Err(reason) => {
                            warn!(key = %raw_key, %reason, "skipping unreadable bundled file");
                            rejected.push(raw_key);
                        }
                    }
                }
            }
            Some(_) => return Err(PortError::Malformed("`files` is not an object".into())),
        }

        Ok(Self {
            state,
            files,
            rejected,
        })
    }

    pub fn to_json(&self) -> PortResult<String> {
        serde_json::to_string(self).map_err(|e| PortError::Malformed(e.to_string()))
    }
}
