use serde::{Deserialize, Serialize};

/// Response of `GET /search?type=track`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySearchResponse {
    pub tracks: SpotifyTrackPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrackPage {
    #[serde(default)]
    pub items: Vec<SpotifyTrack>,
}

/// Spotify track from API
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: SpotifyAlbum,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
    /// "album", "single" or "compilation"
    #[serde(default)]
    pub album_type: String,
}

/// Body for replacing or adding playlist items
#[derive(Debug, Clone, Serialize)]
pub struct SpotifyTrackUris {
    pub uris: Vec<String>,
}

impl SpotifyTrackUris {
    pub fn from_ids(track_ids: &[String]) -> Self {
        Self {
            uris: track_ids
                .iter()
                .map(|id| format!("spotify:track:{}", id))
                .collect(),
        }
    }
}
