use std::time::Duration;

use reqwest::Response;
use serde::de::DeserializeOwned;
use url::Url;

use crate::ports::catalog::CatalogError;
use crate::spotify_rs::types::{SpotifySearchResponse, SpotifyTrack, SpotifyTrackUris};

/// Spotify accepts at most this many items per playlist modification.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Spotify Web API client
pub struct SpotifyClient {
    access_token: String,
    api_base_url: String,
    request_timeout: Duration,
    client: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(
        access_token: String,
        api_base_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        let api_base_url = Url::parse(api_base_url)?;
        Ok(Self {
            access_token,
            api_base_url: api_base_url.as_str().trim_end_matches('/').to_string(),
            request_timeout,
            client: reqwest::Client::new(),
        })
    }

    pub fn search_url(&self, query: &str, limit: u32) -> String {
        format!(
            "{}/search?q={}&type=track&limit={}",
            self.api_base_url,
            urlencoding::encode(query),
            limit
        )
    }

    fn playlist_tracks_url(&self, playlist_id: &str) -> String {
        format!(
            "{}/playlists/{}/tracks",
            self.api_base_url,
            urlencoding::encode(playlist_id)
        )
    }

    /// Search for tracks, most relevant first
    pub async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SpotifyTrack>, CatalogError> {
        let response = self
            .client
            .get(self.search_url(query, limit))
            .bearer_auth(&self.access_token)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(CatalogError::FailedToSendRequest)?;

        let page: SpotifySearchResponse = parse_response(response).await?;
        Ok(page.tracks.items)
    }

    /// Replace all items of a playlist. At most 100 tracks.
    pub async fn replace_playlist_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        let response = self
            .client
            .put(self.playlist_tracks_url(playlist_id))
            .bearer_auth(&self.access_token)
            .timeout(self.request_timeout)
            .json(&SpotifyTrackUris::from_ids(track_ids))
            .send()
            .await
            .map_err(CatalogError::FailedToSendRequest)?;

        check_status(response).await.map(|_| ())
    }

    /// Append items to a playlist. At most 100 tracks.
    pub async fn add_playlist_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        let response = self
            .client
            .post(self.playlist_tracks_url(playlist_id))
            .bearer_auth(&self.access_token)
            .timeout(self.request_timeout)
            .json(&SpotifyTrackUris::from_ids(track_ids))
            .send()
            .await
            .map_err(CatalogError::FailedToSendRequest)?;

        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = match response.text().await {
        Ok(body) if !body.trim().is_empty() => body,
        _ => status.canonical_reason().unwrap_or("unknown").to_string(),
    };
    Err(CatalogError::UnexpectedStatus {
        status: status.as_u16(),
        reason,
    })
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, CatalogError> {
    check_status(response)
        .await?
        .json::<T>()
        .await
        .map_err(CatalogError::FailedToParseResponse)
}
