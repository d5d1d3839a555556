//! Apple Music lyrics service client
//!
//! Resolves a catalog id (searching by free text when needed, matching on
//! ISRC if one was given), then fetches and normalizes the lyrics JSON.
//! Requests are single-shot; retrying is left to the host.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{LyricsProvider, LyricsQuery};
use crate::features::lyrics::parser::LyricsResponse;
use crate::features::lyrics::types::LyricDocument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One catalog search hit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    /// Catalog ids arrive as strings or numbers
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub isrc: Option<String>,
}

impl SearchResult {
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Choose the search hit to fetch lyrics for
///
/// With an ISRC only an exact match counts; without one the first hit wins.
pub fn pick_search_result<'a>(
    results: &'a [SearchResult],
    isrc: Option<&str>,
) -> Option<&'a SearchResult> {
    match isrc {
        Some(isrc) => results.iter().find(|r| r.isrc.as_deref() == Some(isrc)),
        None => results.first(),
    }
}

/// HTTP lyrics provider
#[derive(Debug, Clone)]
pub struct HttpLyricsProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLyricsProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn resolve_id(&self, query: &LyricsQuery) -> Result<Option<String>> {
        if let Some(id) = &query.music_id {
            return Ok(Some(id.clone()));
        }
        let Some(search) = query.query.as_deref() else {
            return Ok(None);
        };

        let results: Vec<SearchResult> = self
            .client
            .get(self.endpoint("searchAppleMusic.php"))
            .query(&[("q", search)])
            .send()
            .await
            .context("searching catalog")?
            .error_for_status()?
            .json()
            .await
            .context("decoding search results")?;

        let picked = pick_search_result(&results, query.isrc.as_deref());
        tracing::debug!(
            "Search {:?} returned {} results, picked {:?}",
            search,
            results.len(),
            picked.and_then(SearchResult::id_string)
        );
        Ok(picked.and_then(SearchResult::id_string))
    }
}

impl LyricsProvider for HttpLyricsProvider {
    async fn fetch_lyrics(&self, query: &LyricsQuery) -> Result<Option<LyricDocument>> {
        let Some(id) = self.resolve_id(query).await? else {
            return Ok(None);
        };

        let response: LyricsResponse = self
            .client
            .get(self.endpoint("getAppleMusicLyrics.php"))
            .query(&[("id", id.as_str())])
            .send()
            .await
            .with_context(|| format!("fetching lyrics for {}", id))?
            .error_for_status()?
            .json()
            .await
            .context("decoding lyrics response")?;

        let lines = response.into_lines();
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(LyricDocument::new(lines)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> Vec<SearchResult> {
        serde_json::from_str(
            r#"[
                {"id": "111", "isrc": "AAA"},
                {"id": 222, "isrc": "BBB"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_pick_first_without_isrc() {
        let results = results();
        let picked = pick_search_result(&results, None).unwrap();
        assert_eq!(picked.id_string().as_deref(), Some("111"));
    }

    #[test]
    fn test_pick_by_isrc() {
        let results = results();
        let picked = pick_search_result(&results, Some("BBB")).unwrap();
        assert_eq!(picked.id_string().as_deref(), Some("222"));
        assert!(pick_search_result(&results, Some("ZZZ")).is_none());
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let provider = HttpLyricsProvider::with_client(reqwest::Client::new(), "https://host/");
        assert_eq!(
            provider.endpoint("getAppleMusicLyrics.php"),
            "https://host/getAppleMusicLyrics.php"
        );
    }

    #[tokio::test]
    async fn test_music_id_skips_search() {
        let provider = HttpLyricsProvider::with_client(reqwest::Client::new(), "http://unused");
        let id = provider.resolve_id(&LyricsQuery::by_id("555")).await.unwrap();
        assert_eq!(id.as_deref(), Some("555"));
        let none = provider.resolve_id(&LyricsQuery::default()).await.unwrap();
        assert!(none.is_none());
    }
}
