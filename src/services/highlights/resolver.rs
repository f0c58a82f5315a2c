use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::normalize::{normalize_for_comparison, sanitize_for_search};
use super::scorer::select_best_candidate;
use super::types::{CandidateTrack, Record};
use crate::config::ResolverSettings;
use crate::ports::catalog::{CatalogError, CatalogSearch};

/// How much of the record context goes into a query. Each step drops one more
/// qualifier; the ladder is walked at most once per track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    Full,
    WithoutYear,
    WithoutAlbum,
}

pub const RELAXATION_STEPS: [Relaxation; 3] = [
    Relaxation::Full,
    Relaxation::WithoutYear,
    Relaxation::WithoutAlbum,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: String,
    pub album_name: Option<String>,
    pub year: Option<String>,
}

impl SearchQuery {
    pub fn build(
        record: &Record,
        track_name: &str,
        relaxation: Relaxation,
        include_album: bool,
    ) -> Self {
        let terms = sanitize_for_search(&format!("{} {}", record.band, track_name));

        let album_name = (include_album && relaxation != Relaxation::WithoutAlbum)
            .then(|| sanitize_for_search(&record.album_name))
            .filter(|album| !album.is_empty());
        let year = (relaxation == Relaxation::Full)
            .then(|| record.release_year().map(str::to_string))
            .flatten();

        Self {
            terms,
            album_name,
            year,
        }
    }

    pub fn as_query_string(&self) -> String {
        let mut query = self.terms.clone();
        if let Some(album_name) = &self.album_name {
            query.push(' ');
            query.push_str(album_name);
        }
        if let Some(year) = &self.year {
            query.push_str(" year:");
            query.push_str(year);
        }
        query
    }
}

/// Normalized inverse edit distance in `[0, 1]`: `1 - distance / max_len`.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Resolves single tracks against the catalog.
///
/// Walks the relaxation ladder until a candidate passes the acceptance gate.
/// A candidate that fails the gate on the last step is rejected.
pub struct Resolver<C: CatalogSearch> {
    catalog: Arc<C>,
    settings: ResolverSettings,
    permits: Arc<Semaphore>,
}

impl<C: CatalogSearch> Resolver<C> {
    pub fn new(catalog: Arc<C>, settings: ResolverSettings) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_searches.max(1)));
        Self {
            catalog,
            settings,
            permits,
        }
    }

    /// Resolve `track_name` of `record` to at most one catalog track.
    ///
    /// `Ok(None)` is a regular no-match. Errors come only from the catalog
    /// (including deadline and cancellation) and should abort the batch.
    pub async fn resolve_track(
        &self,
        record: &Record,
        track_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<CandidateTrack>, CatalogError> {
        if normalize_for_comparison(track_name).is_empty() {
            log::warn!(
                " skipping track without a usable name for {} - {}",
                record.band,
                record.album_name
            );
            return Ok(None);
        }

        let mut previous: Option<SearchQuery> = None;
        for relaxation in RELAXATION_STEPS {
            let query = SearchQuery::build(
                record,
                track_name,
                relaxation,
                self.settings.include_album_in_query,
            );
            // A step that changes nothing (no year, no album) is skipped.
            if previous.as_ref() == Some(&query) {
                continue;
            }
            if previous.is_some() {
                log::debug!(" relaxing query for {} ({:?})", track_name, relaxation);
            }

            if let Some(candidate) = self.attempt(record, track_name, &query, cancel).await? {
                return Ok(Some(candidate));
            }
            previous = Some(query);
        }

        log::info!(" nothing found for {} - {}", record.band, track_name);
        Ok(None)
    }

    async fn attempt(
        &self,
        record: &Record,
        track_name: &str,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<Option<CandidateTrack>, CatalogError> {
        let query_string = query.as_query_string();
        if query_string.is_empty() {
            return Ok(None);
        }

        log::info!(" searching term: {}", query_string);
        let candidates = self.search(&query_string, cancel).await?;
        if candidates.is_empty() {
            log::debug!(" no results for {}", query_string);
            return Ok(None);
        }

        for item in candidates.iter().take(self.settings.max_logged_candidates) {
            log::debug!(
                " found item: {} - {} ({}) [{:?}]",
                item.primary_artist(),
                item.name,
                item.album.name,
                item.album.album_type
            );
        }

        let Some(best) = select_best_candidate(&candidates, track_name, record) else {
            return Ok(None);
        };

        if !self.passes_gate(best, track_name, record) {
            return Ok(None);
        }

        log::info!(
            " using item: {} - {} ({}) [{:?}]",
            best.primary_artist(),
            best.name,
            best.album.name,
            best.album.album_type
        );
        Ok(Some(best.clone()))
    }

    /// Fuzzy check that the chosen candidate is really by the reviewed band and
    /// really the highlighted track.
    fn passes_gate(&self, candidate: &CandidateTrack, track_name: &str, record: &Record) -> bool {
        let threshold = self.settings.similarity_threshold;

        let band_from_search = candidate
            .artists
            .iter()
            .take(2)
            .map(|artist| normalize_for_comparison(artist))
            .collect::<Vec<_>>()
            .join(" ");
        let band_from_record = normalize_for_comparison(&record.band);
        let band_similarity = similarity(&band_from_search, &band_from_record);
        log::debug!(
            " band similarity between {} and {}: {:.2}",
            band_from_search,
            band_from_record,
            band_similarity
        );
        if band_similarity < threshold {
            log::info!(
                " not adding item {} - {} ({}) since artists don't match ({} != {})",
                band_from_search,
                candidate.name,
                candidate.album.name,
                band_from_record,
                band_from_search
            );
            return false;
        }

        let track_from_search = normalize_for_comparison(&candidate.name);
        let track_from_record = normalize_for_comparison(track_name);
        let track_similarity = similarity(&track_from_search, &track_from_record);
        log::debug!(
            " track similarity between {} and {}: {:.2}",
            track_from_search,
            track_from_record,
            track_similarity
        );
        if track_similarity < threshold {
            log::info!(
                " not adding item {} - {} ({}) since tracknames don't match ({} != {})",
                band_from_search,
                candidate.name,
                candidate.album.name,
                track_from_record,
                track_from_search
            );
            return false;
        }

        true
    }

    /// One catalog call, bounded by the search deadline and the batch token.
    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| CatalogError::Cancelled)?,
        };
        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        let deadline = self.settings.search_timeout;
        let search = tokio::time::timeout(deadline, self.catalog.search_tracks(query));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CatalogError::Cancelled),
            result = search => result.map_err(|_| CatalogError::Timeout(deadline))?,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::Sequence;

    use super::*;
    use crate::ports::catalog::MockCatalogSearch;
    use crate::services::highlights::types::AlbumType;
    use crate::test_utils::{candidate, record, record_with_year};

    fn resolver(catalog: MockCatalogSearch) -> Resolver<MockCatalogSearch> {
        Resolver::new(Arc::new(catalog), ResolverSettings::default())
    }

    #[test]
    fn test_query_ladder() {
        let record = record_with_year("Sigur Rós", "Ágætis byrjun", "1999", &[]);

        let full = SearchQuery::build(&record, "Svefn-g-englar", Relaxation::Full, true);
        assert_eq!(
            full.as_query_string(),
            "Sigur Ros Svefn g englar Agætis byrjun year:1999"
        );

        let without_year =
            SearchQuery::build(&record, "Svefn-g-englar", Relaxation::WithoutYear, true);
        assert_eq!(
            without_year.as_query_string(),
            "Sigur Ros Svefn g englar Agætis byrjun"
        );

        let bare = SearchQuery::build(&record, "Svefn-g-englar", Relaxation::WithoutAlbum, true);
        assert_eq!(bare.as_query_string(), "Sigur Ros Svefn g englar");
    }

    #[test]
    fn test_query_without_album_keeps_year_on_first_step() {
        let record = record_with_year("Band", "Album", "2021", &[]);
        let query = SearchQuery::build(&record, "Song (feat. Guest)", Relaxation::Full, false);
        assert_eq!(query.as_query_string(), "Band Song year:2021");
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert!((similarity("the beatles", "the beetles") - (1.0 - 1.0 / 11.0)).abs() < 1e-9);
        assert!(similarity("radiohead", "coldplay") < 0.8);
    }

    #[tokio::test]
    async fn test_accepts_matching_candidate_on_first_search() {
        let mut catalog = MockCatalogSearch::new();
        catalog
            .expect_search_tracks()
            .withf(|query: &str| query == "Band Song Album year:2020")
            .times(1)
            .returning(|_| {
                Ok(vec![candidate("id-1", "Song", &["Band"], "Album", AlbumType::Album)])
            });

        let record = record_with_year("Band", "Album", "2020", &[]);
        let found = resolver(catalog)
            .resolve_track(&record, "Song", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(found.map(|c| c.id), Some("id-1".to_string()));
    }

    #[tokio::test]
    async fn test_relaxes_year_then_album_when_nothing_found() {
        let mut seq = Sequence::new();
        let mut catalog = MockCatalogSearch::new();
        catalog
            .expect_search_tracks()
            .withf(|query: &str| query == "Band Song Album year:2020")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        catalog
            .expect_search_tracks()
            .withf(|query: &str| query == "Band Song Album")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        catalog
            .expect_search_tracks()
            .withf(|query: &str| query == "Band Song")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(vec![candidate("id-2", "Song", &["Band"], "Other", AlbumType::Single)])
            });

        let record = record_with_year("Band", "Album", "2020", &[]);
        let found = resolver(catalog)
            .resolve_track(&record, "Song", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(found.map(|c| c.id), Some("id-2".to_string()));
    }

    #[tokio::test]
    async fn test_gives_up_after_two_relaxations() {
        let mut catalog = MockCatalogSearch::new();
        catalog
            .expect_search_tracks()
            .times(3)
            .returning(|_| Ok(vec![]));

        let record = record_with_year("Band", "Album", "2020", &[]);
        let found = resolver(catalog)
            .resolve_track(&record, "Song", &CancellationToken::new())
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_skips_relaxation_steps_that_change_nothing() {
        let mut catalog = MockCatalogSearch::new();
        // No year: the year step would repeat the first query.
        catalog
            .expect_search_tracks()
            .withf(|query: &str| query == "Band Song Album")
            .times(1)
            .returning(|_| Ok(vec![]));
        catalog
            .expect_search_tracks()
            .withf(|query: &str| query == "Band Song")
            .times(1)
            .returning(|_| Ok(vec![]));

        let record = record("Band", "Album", 7, &[]);
        let found = resolver(catalog)
            .resolve_track(&record, "Song", &CancellationToken::new())
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_rejects_wrong_band_when_no_relaxation_remains() {
        let mut catalog = MockCatalogSearch::new();
        catalog
            .expect_search_tracks()
            .times(2)
            .returning(|_| {
                Ok(vec![candidate(
                    "id-cover",
                    "Song",
                    &["Completely Different"],
                    "Covers",
                    AlbumType::Album,
                )])
            });

        let record = record("Band", "Album", 7, &[]);
        let found = resolver(catalog)
            .resolve_track(&record, "Song", &CancellationToken::new())
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_gate_failure_relaxes_and_retries() {
        let mut seq = Sequence::new();
        let mut catalog = MockCatalogSearch::new();
        catalog
            .expect_search_tracks()
            .withf(|query: &str| query == "Band Song Album")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(vec![candidate("id-wrong", "Another Tune", &["Band"], "Album", AlbumType::Album)])
            });
        catalog
            .expect_search_tracks()
            .withf(|query: &str| query == "Band Song")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(vec![candidate("id-right", "Song", &["Band"], "Single", AlbumType::Single)])
            });

        let record = record("Band", "Album", 7, &[]);
        let found = resolver(catalog)
            .resolve_track(&record, "Song", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(found.map(|c| c.id), Some("id-right".to_string()));
    }

    #[tokio::test]
    async fn test_two_artist_band_names_pass_gate() {
        let mut catalog = MockCatalogSearch::new();
        catalog.expect_search_tracks().times(1).returning(|_| {
            Ok(vec![candidate(
                "id-duo",
                "Duet",
                &["Fever Ray", "Olof Dreijer"],
                "Collab",
                AlbumType::Album,
            )])
        });

        let record = record("Fever Ray & Olof Dreijer", "Collab", 9, &[]);
        let found = resolver(catalog)
            .resolve_track(&record, "Duet", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(found.map(|c| c.id), Some("id-duo".to_string()));
    }

    #[tokio::test]
    async fn test_empty_track_name_never_searches() {
        let mut catalog = MockCatalogSearch::new();
        catalog.expect_search_tracks().never();

        let record = record("", "", 0, &[]);
        let found = resolver(catalog)
            .resolve_track(&record, "  ", &CancellationToken::new())
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_catalog_error_propagates() {
        let mut catalog = MockCatalogSearch::new();
        catalog
            .expect_search_tracks()
            .times(1)
            .returning(|_| Err(CatalogError::Unavailable("down".into())));

        let record = record("Band", "Album", 7, &[]);
        let result = resolver(catalog)
            .resolve_track(&record, "Song", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CatalogError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_searching() {
        let mut catalog = MockCatalogSearch::new();
        catalog.expect_search_tracks().never();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let record = record("Band", "Album", 7, &[]);
        let result = resolver(catalog).resolve_track(&record, "Song", &cancel).await;

        assert!(matches!(result, Err(CatalogError::Cancelled)));
    }

    struct StuckCatalog;

    #[async_trait::async_trait]
    impl CatalogSearch for StuckCatalog {
        async fn search_tracks(&self, _query: &str) -> Result<Vec<CandidateTrack>, CatalogError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stuck_search_hits_deadline() {
        let settings = ResolverSettings {
            search_timeout: Duration::from_millis(50),
            ..ResolverSettings::default()
        };
        let resolver = Resolver::new(Arc::new(StuckCatalog), settings);

        let record = record("Band", "Album", 7, &[]);
        let result = resolver
            .resolve_track(&record, "Song", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CatalogError::Timeout(d)) if d == Duration::from_millis(50)));
    }
}
