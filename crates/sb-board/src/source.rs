//! Where new sound content comes from.

use std::path::Path;

use async_trait::async_trait;
use sb_store::Blob;

use crate::error::{BoardError, BoardResult};

/// Fetches content for a new sound.
#[async_trait]
pub trait SoundSource: Send + Sync {
    /// Fetch the content named by `locator`. Failures are
    /// [`BoardError::SourceFetchFailed`].
    async fn fetch(&self, locator: &str) -> BoardResult<Blob>;
}

/// Reads sounds from local files.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSource;

#[async_trait]
impl SoundSource for FileSource {
    async fn fetch(&self, locator: &str) -> BoardResult<Blob> {
        let path = Path::new(locator);
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| BoardError::SourceFetchFailed(format!("{locator}: {e}")))?;
        Ok(Blob::new(media_type_for(path), data))
    }
}

/// Media type implied by a file extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("opus") => "audio/opus",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// Display name for content fetched from `locator`: the last path segment
/// without any query string.
pub fn name_from_locator(locator: &str) -> String {
    let path = locator.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit(['/', '\\']).next().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "audio".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_from_locators() {
        assert_eq!(name_from_locator("/tmp/kick.wav"), "kick.wav");
        assert_eq!(name_from_locator("https://x.test/a/snare.mp3?v=2"), "snare.mp3");
        assert_eq!(name_from_locator("C:\\sounds\\hat.ogg"), "hat.ogg");
        assert_eq!(name_from_locator("https://x.test/"), "audio");
        assert_eq!(name_from_locator(""), "audio");
    }

    #[test]
    fn extensions_map_to_media_types() {
        assert_eq!(media_type_for(Path::new("a.WAV")), "audio/wav");
        assert_eq!(media_type_for(Path::new("a.oga")), "audio/ogg");
        assert_eq!(media_type_for(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(media_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn file_source_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kick.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let blob = FileSource.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(blob.media_type, "audio/wav");
        assert_eq!(blob.data, b"RIFF");
    }

    #[tokio::test]
    async fn missing_file_is_fetch_failure() {
        let err = FileSource.fetch("/definitely/not/here.wav").await.unwrap_err();
        assert!(matches!(err, BoardError::SourceFetchFailed(_)));
    }
}
