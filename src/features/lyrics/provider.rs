//! Lyrics providers
//!
//! A provider turns song identifiers into a parsed `LyricDocument`. Providers
//! may fail; callers go through [`load_document`], which logs the failure and
//! reports "no lyrics" instead.

mod file;
mod http;

pub use file::FileLyricsProvider;
pub use http::{HttpLyricsProvider, SearchResult, pick_search_result};

use std::future::Future;

use anyhow::Result;

use super::types::LyricDocument;

/// Identifiers a host can hand to a provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricsQuery {
    /// Free-text search ("artist title")
    pub query: Option<String>,
    /// Catalog id; skips the search step when present
    pub music_id: Option<String>,
    /// Disambiguates search results
    pub isrc: Option<String>,
}

impl LyricsQuery {
    pub fn by_id(music_id: impl Into<String>) -> Self {
        Self {
            music_id: Some(music_id.into()),
            ..Default::default()
        }
    }

    pub fn by_search(query: impl Into<String>, isrc: Option<String>) -> Self {
        Self {
            query: Some(query.into()),
            isrc,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.music_id.is_none()
    }
}

/// Source of lyric documents
pub trait LyricsProvider {
    /// Fetch lyrics; `Ok(None)` means the provider has nothing for this song
    fn fetch_lyrics(
        &self,
        query: &LyricsQuery,
    ) -> impl Future<Output = Result<Option<LyricDocument>>> + Send;
}

/// Fetch a document, treating every failure as "no lyrics"
pub async fn load_document<P: LyricsProvider>(
    provider: &P,
    query: &LyricsQuery,
) -> Option<LyricDocument> {
    if query.is_empty() {
        return None;
    }

    match provider.fetch_lyrics(query).await {
        Ok(Some(document)) if !document.is_empty() => {
            tracing::info!(
                "Loaded {} lyric lines (word synced: {})",
                document.len(),
                document.is_word_synced()
            );
            Some(document)
        }
        Ok(_) => {
            tracing::debug!("No lyrics found for {:?}", query);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to fetch lyrics for {:?}: {:#}", query, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lyrics::types::{LyricLine, Syllable};

    struct Failing;

    impl LyricsProvider for Failing {
        async fn fetch_lyrics(&self, _query: &LyricsQuery) -> Result<Option<LyricDocument>> {
            anyhow::bail!("service unavailable")
        }
    }

    struct Fixed(LyricDocument);

    impl LyricsProvider for Fixed {
        async fn fetch_lyrics(&self, _query: &LyricsQuery) -> Result<Option<LyricDocument>> {
            Ok(Some(self.0.clone()))
        }
    }

    #[tokio::test]
    async fn test_failure_becomes_none() {
        assert!(load_document(&Failing, &LyricsQuery::by_id("1")).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_document_becomes_none() {
        let provider = Fixed(LyricDocument::default());
        assert!(load_document(&provider, &LyricsQuery::by_id("1")).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_query_skips_provider() {
        let doc = LyricDocument::new(vec![LyricLine {
            main_syllables: vec![Syllable::new("hi", false, 0, 1000)],
            start_ms: 0,
            end_ms: 1000,
            ..Default::default()
        }]);
        let provider = Fixed(doc);
        assert!(load_document(&provider, &LyricsQuery::default()).await.is_none());
        assert!(load_document(&provider, &LyricsQuery::by_id("1")).await.is_some());
    }
}
