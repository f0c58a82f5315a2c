use serde::{Deserialize, Serialize};

/// A reviewed record with its highlighted tracks, as delivered by the crawler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub band: String,
    pub album_name: String,
    /// Review URL, unique per record.
    pub link: String,
    pub score: i32,
    #[serde(default)]
    pub release_year: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Record {
    pub fn release_year(&self) -> Option<&str> {
        self.release_year
            .as_deref()
            .map(str::trim)
            .filter(|year| !year.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub band: String,
    pub track_name: String,
    /// Filled in once the track has been resolved against the catalog.
    #[serde(default)]
    pub resolved_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlbumType {
    Album,
    Single,
    Ep,
    Other,
}

impl AlbumType {
    /// Maps the catalog's album type string. Anything unknown (e.g. "compilation")
    /// is `Other`.
    pub fn from_catalog(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "album" => AlbumType::Album,
            "single" => AlbumType::Single,
            "ep" => AlbumType::Ep,
            _ => AlbumType::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAlbum {
    pub name: String,
    pub album_type: AlbumType,
}

/// One entry of a ranked catalog search result. Never cached across searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: CandidateAlbum,
}

impl CandidateTrack {
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or_default()
    }
}

/// A matched catalog id together with the record it was found for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub track_id: String,
    pub owner_band: String,
    pub owner_score: i32,
    /// Position of the owning record and of the track within it. Only used
    /// to keep the final order independent of task completion order.
    pub position: (usize, usize),
}

/// Result of a whole batch, also used as the partial result of an aborted one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub records: Vec<Record>,
    /// Ordered and deduplicated, ready for the playlist.
    pub track_ids: Vec<String>,
    /// `"band - track"` entries, sorted. May contain duplicates.
    pub not_found: Vec<String>,
    pub total: usize,
    pub found: usize,
    /// Tracks whose resolution was cut short by an aborted batch.
    pub aborted: usize,
}

impl BatchReport {
    pub fn log_summary(&self) {
        log::info!("--- RESULTS ---");
        log::info!("total tracks:     {}", self.total);
        log::info!("found tracks:     {}", self.found);
        log::info!("not found tracks: {}", self.not_found.len());
        if self.aborted > 0 {
            log::warn!("aborted tracks:   {}", self.aborted);
        }
        if !self.not_found.is_empty() {
            log::info!("Not found items:");
            for entry in &self.not_found {
                log::info!(" {}", entry);
            }
        }
    }
}
