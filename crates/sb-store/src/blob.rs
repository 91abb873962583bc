use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Opaque audio content plus the media type it arrived with.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob. A blank media type becomes `application/octet-stream`.
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        let media_type = media_type.into();
        let media_type = match media_type.trim() {
            "" => FALLBACK_MEDIA_TYPE.to_string(),
            trimmed => trimmed.to_ascii_lowercase(),
        };
        Self { media_type, data }
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the media type names audio content.
    pub fn is_audio(&self) -> bool {
        self.media_type.starts_with("audio/")
    }

    /// Encode as a self-contained `data:<type>;base64,<payload>` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.data))
    }

    /// Decode a data URL produced by [`Blob::to_data_url`] or by a browser.
    ///
    /// Payloads without a `;base64` marker are taken as literal bytes.
    pub fn from_data_url(url: &str) -> StoreResult<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| StoreError::InvalidInline("missing data: scheme".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| StoreError::InvalidInline("missing ',' separator".into()))?;

        let mut params = header.split(';');
        let media_type = params.next().unwrap_or_default().to_string();
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

        let data = if is_base64 {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| StoreError::InvalidInline(e.to_string()))?
        } else {
            payload.as_bytes().to_vec()
        };
        Ok(Self::new(media_type, data))
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}
