//! iTunes Search API client
//!
//! Public, keyless catalog of music metadata.
//! API Documentation: https://performance-partners.apple.com/search-api

use super::models::{AlbumDetails, SearchType, Track};
use anyhow::Context;
use serde::Deserialize;

/// Envelope shared by `/search` and `/lookup`.
#[derive(Debug, Deserialize)]
pub struct ItunesResponse {
    #[serde(default)]
    pub results: Vec<ItunesItem>,
}

/// One raw result; songs, albums and collection headers share this shape.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ItunesItem {
    pub wrapper_type: Option<String>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub collection_name: Option<String>,
    pub collection_id: Option<u64>,
    pub artwork_url100: Option<String>,
    pub preview_url: Option<String>,
    pub primary_genre_name: Option<String>,
    pub release_date: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub copyright: Option<String>,
    pub track_count: Option<u32>,
}

impl ItunesItem {
    pub fn into_track(self) -> Track {
        let collection_name = self.collection_name.unwrap_or_default();
        let artwork_url_100 = self.artwork_url100.unwrap_or_default();
        let high_res_artwork = artwork_url_100.replace("100x100bb", "800x800bb");
        Track {
            track_name: self.track_name.unwrap_or_else(|| collection_name.clone()),
            artist_name: self.artist_name.unwrap_or_default(),
            collection_name,
            collection_id: self.collection_id,
            artwork_url_100,
            high_res_artwork,
            preview_url: self.preview_url,
            primary_genre_name: self.primary_genre_name,
            release_date: self.release_date,
            track_number: self.track_number,
            disc_number: self.disc_number,
        }
    }
}

/// Album from a lookup response: collection header first, then its songs.
pub fn album_from_lookup(response: ItunesResponse) -> Option<AlbumDetails> {
    let mut results = response.results.into_iter();
    let collection = results.next()?;

    let mut tracks: Vec<Track> = results
        .filter(|item| item.wrapper_type.as_deref() == Some("track"))
        .map(ItunesItem::into_track)
        .collect();
    tracks.sort_by_key(|t| (t.disc_number.unwrap_or(1), t.track_number.unwrap_or(0)));

    Some(AlbumDetails {
        copyright: collection.copyright.unwrap_or_default(),
        track_count: collection
            .track_count
            .filter(|&n| n > 0)
            .unwrap_or(tracks.len() as u32),
        tracks,
    })
}

/// iTunes catalog client
#[derive(Debug, Clone)]
pub struct ItunesClient {
    client: reqwest::Client,
    base_url: String,
}

impl ItunesClient {
    const USER_AGENT: &'static str = "sleevd/0.1.0";
    const ALBUM_LIMIT: u32 = 200;

    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(Self::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .context("build reqwest client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Best single match for a query, `None` when nothing matches.
    pub async fn search(&self, query: &str, kind: SearchType) -> anyhow::Result<Option<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let url = format!(
            "{}/search?term={}&media=music&entity={}&limit=1",
            self.base_url,
            urlencoding::encode(query),
            kind.entity()
        );
        let body = self.get(&url).await.context("catalog search")?;
        Ok(body.results.into_iter().next().map(ItunesItem::into_track))
    }

    /// Full album tracklist, ordered by disc then track number.
    ///
    /// Failures are logged and reported as `None`.
    pub async fn album(&self, collection_id: u64) -> Option<AlbumDetails> {
        let url = format!(
            "{}/lookup?id={collection_id}&entity=song&limit={}",
            self.base_url,
            Self::ALBUM_LIMIT
        );
        match self.get(&url).await {
            Ok(body) => album_from_lookup(body),
            Err(e) => {
                tracing::warn!("failed to fetch album details: {e:#}");
                None
            }
        }
    }

    async fn get(&self, url: &str) -> anyhow::Result<ItunesResponse> {
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            // iTunes answers with text/javascript, so parse the body ourselves
            let raw = response.text().await?;
            let body = serde_json::from_str(&raw).context("parse catalog json")?;
            Ok(body)
        } else {
            anyhow::bail!("iTunes API error: {}", response.status());
        }
    }
}
