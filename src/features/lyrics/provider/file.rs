//! Local lyrics files
//!
//! Looks up `<dir>/<music_id>.<ext>`, preferring word-level formats.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{LyricsProvider, LyricsQuery};
use crate::features::lyrics::parser::parse_lyrics;
use crate::features::lyrics::types::LyricDocument;

/// Extensions tried in order
const EXTENSIONS: &[&str] = &["ttml", "json", "eslrc", "lrc"];

/// Provider backed by a directory of lyric files
#[derive(Debug, Clone)]
pub struct FileLyricsProvider {
    dir: PathBuf,
}

impl FileLyricsProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Find an existing lyrics file for an id
    fn find_file(&self, id: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", id, ext)))
            .find(|p| p.exists())
    }

    /// Read and parse a single file, whatever its format
    pub async fn load_file(path: &Path) -> Result<LyricDocument> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let document =
            parse_lyrics(&content).with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!("Parsed {} lines from {:?}", document.len(), path);
        Ok(document)
    }
}

impl LyricsProvider for FileLyricsProvider {
    async fn fetch_lyrics(&self, query: &LyricsQuery) -> Result<Option<LyricDocument>> {
        let Some(id) = query.music_id.as_deref() else {
            return Ok(None);
        };
        // Ids come from the host; keep lookups inside the directory
        if id.contains(['/', '\\']) || id.contains("..") {
            anyhow::bail!("invalid lyrics id {:?}", id);
        }
        match self.find_file(id) {
            Some(path) => Ok(Some(Self::load_file(&path).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefers_word_level_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("42.lrc"), "[00:01.00]line level\n").unwrap();
        std::fs::write(
            dir.path().join("42.eslrc"),
            "[00:01.00]word[00:01.50] level[00:02.00]\n",
        )
        .unwrap();

        let provider = FileLyricsProvider::new(dir.path());
        let doc = provider
            .fetch_lyrics(&LyricsQuery::by_id("42"))
            .await
            .unwrap()
            .unwrap();
        assert!(doc.is_word_synced());
        assert_eq!(doc.lines()[0].text(), "word level");
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileLyricsProvider::new(dir.path());
        let result = provider.fetch_lyrics(&LyricsQuery::by_id("7")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileLyricsProvider::new(dir.path());
        assert!(
            provider
                .fetch_lyrics(&LyricsQuery::by_id("../etc/passwd"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_unparseable_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("9.json"), "{broken").unwrap();
        let provider = FileLyricsProvider::new(dir.path());
        assert!(provider.fetch_lyrics(&LyricsQuery::by_id("9")).await.is_err());
    }
}
