use super::normalize::normalize_for_comparison;
use super::types::{AlbumType, CandidateTrack, Record};

/// Bonus for a candidate whose title and album both match the record, i.e. the
/// title track of the reviewed record.
const TITLE_TRACK_BONUS: usize = 1000;
const FULL_ALBUM_BONUS: usize = 100;
const SINGLE_BONUS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredCandidate<'a> {
    pub index: usize,
    pub candidate: &'a CandidateTrack,
    pub score: usize,
}

fn album_type_bonus(album_type: AlbumType) -> usize {
    match album_type {
        AlbumType::Album => FULL_ALBUM_BONUS,
        AlbumType::Single => SINGLE_BONUS,
        AlbumType::Ep | AlbumType::Other => 0,
    }
}

/// Score every candidate of a ranked result list.
///
/// Index 0 is the most relevant result. The positional term `len - index` is
/// strictly decreasing, so equal scores can only happen for identical
/// candidates.
pub fn score_candidates<'a>(
    candidates: &'a [CandidateTrack],
    track_name: &str,
    record: &Record,
) -> Vec<ScoredCandidate<'a>> {
    let normalized_track_name = normalize_for_comparison(track_name);
    let normalized_album_name = normalize_for_comparison(&record.album_name);
    let total = candidates.len();

    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let mut score = 0;

            if normalize_for_comparison(&candidate.name) == normalized_track_name
                && normalize_for_comparison(&candidate.album.name) == normalized_album_name
            {
                score += TITLE_TRACK_BONUS;
            }
            score += album_type_bonus(candidate.album.album_type);
            score += total - index;

            log::debug!(
                " [Score {}] {} - {} ({}) [{:?}]",
                score,
                candidate.primary_artist(),
                candidate.name,
                candidate.album.name,
                candidate.album.album_type
            );

            ScoredCandidate {
                index,
                candidate,
                score,
            }
        })
        .collect()
}

/// Pick the best candidate, or `None` for an empty result list.
pub fn select_best_candidate<'a>(
    candidates: &'a [CandidateTrack],
    track_name: &str,
    record: &Record,
) -> Option<&'a CandidateTrack> {
    score_candidates(candidates, track_name, record)
        .into_iter()
        // max_by_key returns the last maximum; reversing keeps the earliest one
        .rev()
        .max_by_key(|scored| scored.score)
        .map(|scored| scored.candidate)
}
