use std::collections::BTreeMap;

use sb_snapshot::encode;
use sb_store::BlobStore;
use sb_types::Workspace;
use tracing::{info, warn};

use crate::document::{PortableDocument, PortableFile};
use crate::error::PortResult;

/// Bundle `ws` and the content of every library entry.
///
/// Only library keys are bundled. A sound placed from content that was
/// never promoted to the library travels without its blob, and a library
/// entry whose blob is already gone is skipped.
pub async fn export(ws: &Workspace, store: &dyn BlobStore) -> PortResult<PortableDocument> {
    let mut files = BTreeMap::new();
    for entry in ws.library() {
        let Some(blob) = store.get(&entry.key).await? else {
            warn!(key = %entry.key, "library blob missing; not bundled");
            continue;
        };
        files.insert(
            entry.key.clone(),
            PortableFile {
                name: entry.display_name.clone(),
                inline_content: blob.to_data_url(),
            },
        );
    }

    info!(files = files.len(), "board exported");
    Ok(PortableDocument {
        state: encode(ws),
        files,
        rejected: Vec::new(),
    })
}
