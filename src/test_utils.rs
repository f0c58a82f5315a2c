use crate::services::highlights::types::{AlbumType, CandidateAlbum, CandidateTrack, Record, Track};

pub fn candidate(
    id: &str,
    name: &str,
    artists: &[&str],
    album_name: &str,
    album_type: AlbumType,
) -> CandidateTrack {
    CandidateTrack {
        id: id.to_string(),
        name: name.to_string(),
        artists: artists.iter().map(|artist| artist.to_string()).collect(),
        album: CandidateAlbum {
            name: album_name.to_string(),
            album_type,
        },
    }
}

pub fn record(band: &str, album_name: &str, score: i32, tracks: &[&str]) -> Record {
    Record {
        band: band.to_string(),
        album_name: album_name.to_string(),
        link: format!(
            "https://reviews.example/{}",
            band.to_lowercase().replace(' ', "-")
        ),
        score,
        release_year: None,
        image: None,
        tracks: tracks
            .iter()
            .map(|track_name| Track {
                band: band.to_string(),
                track_name: track_name.to_string(),
                resolved_link: None,
            })
            .collect(),
    }
}

pub fn record_with_year(band: &str, album_name: &str, year: &str, tracks: &[&str]) -> Record {
    Record {
        release_year: Some(year.to_string()),
        ..record(band, album_name, 7, tracks)
    }
}
