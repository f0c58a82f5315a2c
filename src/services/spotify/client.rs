use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use color_eyre::eyre::{Result, WrapErr};

use crate::config::SpotifyConfig;
use crate::ports::catalog::{CatalogError, CatalogSearch};
use crate::ports::playlist::PlaylistWriter;
use crate::services::highlights::types::{AlbumType, CandidateAlbum, CandidateTrack};
use crate::spotify_rs::client::{MAX_TRACKS_PER_REQUEST, SpotifyClient};
use crate::spotify_rs::types::SpotifyTrack;

const MAX_RETRIES: usize = 3;

/// Spotify backed catalog and playlist writer.
///
/// Requests failing with a transient error are retried with exponential
/// backoff. Anything else is returned immediately.
pub struct SpotifyHttpAdapter {
    client: SpotifyClient,
    search_limit: u32,
}

impl SpotifyHttpAdapter {
    pub fn new(config: &SpotifyConfig, access_token: String) -> Result<Self> {
        let client = SpotifyClient::new(
            access_token,
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
        .wrap_err(format!("Invalid Spotify API url: {}", config.api_base_url))?;
        Ok(Self {
            client,
            search_limit: config.search_limit.max(1),
        })
    }

    fn backoff() -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_times(MAX_RETRIES)
    }
}

fn notify_retry(error: &CatalogError, delay: Duration) {
    log::warn!("Spotify request failed ({}), retrying in {:?}", error, delay);
}

impl From<SpotifyTrack> for CandidateTrack {
    fn from(track: SpotifyTrack) -> Self {
        CandidateTrack {
            id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|artist| artist.name).collect(),
            album: CandidateAlbum {
                album_type: AlbumType::from_catalog(&track.album.album_type),
                name: track.album.name,
            },
        }
    }
}

#[async_trait::async_trait]
impl CatalogSearch for SpotifyHttpAdapter {
    async fn search_tracks(&self, query: &str) -> Result<Vec<CandidateTrack>, CatalogError> {
        let tracks = (|| self.client.search_tracks(query, self.search_limit))
            .retry(Self::backoff())
            .when(CatalogError::is_transient)
            .notify(notify_retry)
            .await?;

        Ok(tracks.into_iter().map(CandidateTrack::from).collect())
    }
}

#[async_trait::async_trait]
impl PlaylistWriter for SpotifyHttpAdapter {
    async fn replace_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let (first, rest) = track_ids.split_at(track_ids.len().min(MAX_TRACKS_PER_REQUEST));
        (|| self.client.replace_playlist_tracks(playlist_id, first))
            .retry(Self::backoff())
            .when(CatalogError::is_transient)
            .notify(notify_retry)
            .await
            .wrap_err(format!("Failed to replace tracks of playlist {}", playlist_id))?;

        if !rest.is_empty() {
            self.add_tracks(playlist_id, rest).await?;
        }
        Ok(())
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        for chunk in track_ids.chunks(MAX_TRACKS_PER_REQUEST) {
            (|| self.client.add_playlist_tracks(playlist_id, chunk))
                .retry(Self::backoff())
                .when(CatalogError::is_transient)
                .notify(notify_retry)
                .await
                .wrap_err(format!("Failed to add tracks to playlist {}", playlist_id))?;
            log::debug!("Added {} tracks to playlist {}", chunk.len(), playlist_id);
        }
        Ok(())
    }
}
