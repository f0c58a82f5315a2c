use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::ordering::playlist_track_ids;
use super::resolver::Resolver;
use super::types::{BatchReport, Record, ResolvedItem};
use crate::config::BatchConfig;
use crate::ports::catalog::{CatalogError, CatalogSearch};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Catalog search failed for {band} - {track}: {source}")]
    Catalog {
        band: String,
        track: String,
        #[source]
        source: CatalogError,
        partial: Box<BatchReport>,
    },
    #[error("Batch cancelled")]
    Cancelled { partial: Box<BatchReport> },
}

impl BatchError {
    /// Whatever was resolved before the batch stopped.
    pub fn partial_report(&self) -> &BatchReport {
        match self {
            BatchError::Catalog { partial, .. } | BatchError::Cancelled { partial } => partial,
        }
    }
}

/// Messages from track tasks to the collector. The collector is the only
/// owner of the aggregated lists.
#[derive(Debug)]
enum TrackOutcome {
    Found(ResolvedItem),
    NotFound { band: String, track_name: String },
    Failed {
        band: String,
        track_name: String,
        error: CatalogError,
    },
}

#[derive(Debug, Default)]
struct Collected {
    resolved: Vec<ResolvedItem>,
    not_found: Vec<String>,
    failure: Option<(String, String, CatalogError)>,
}

async fn collect_outcomes(mut receiver: mpsc::UnboundedReceiver<TrackOutcome>) -> Collected {
    let mut collected = Collected::default();
    while let Some(outcome) = receiver.recv().await {
        match outcome {
            TrackOutcome::Found(item) => {
                log::debug!("adding item to collection to be added: {}", item.track_id);
                collected.resolved.push(item);
            }
            TrackOutcome::NotFound { band, track_name } => {
                collected.not_found.push(format!("{} - {}", band, track_name));
            }
            TrackOutcome::Failed {
                band,
                track_name,
                error,
            } => {
                log::error!("Catalog search failed for {} - {}: {}", band, track_name, error);
                if collected.failure.is_none() {
                    collected.failure = Some((band, track_name, error));
                }
            }
        }
    }
    collected
}

/// Resolves all tracks of all records concurrently and assembles the final,
/// ordered and deduplicated playlist.
pub struct Orchestrator<C: CatalogSearch + 'static> {
    resolver: Arc<Resolver<C>>,
    config: BatchConfig,
}

impl<C: CatalogSearch + 'static> Orchestrator<C> {
    pub fn new(catalog: Arc<C>, config: BatchConfig) -> Self {
        let resolver = Arc::new(Resolver::new(catalog, config.resolver.clone()));
        Self { resolver, config }
    }

    /// Run one batch.
    ///
    /// One task per record, each fanning out to one task per track. All
    /// outcomes flow through a channel into a single collector task. The first
    /// catalog failure cancels the remaining searches; `cancel` lets the caller
    /// abort the batch. In both cases the partial report is returned inside
    /// the error.
    pub async fn run(
        &self,
        mut records: Vec<Record>,
        record_of_the_week: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        if records.len() > self.config.max_records {
            log::info!(
                "Limiting {} records to the first {}",
                records.len(),
                self.config.max_records
            );
            records.truncate(self.config.max_records);
        }
        log::info!("Size of records of the week: {}", records.len());

        let total: usize = records.iter().map(|record| record.tracks.len()).sum();
        let batch_token = cancel.child_token();
        let (sender, receiver) = mpsc::unbounded_channel();
        let collector = tokio::spawn(collect_outcomes(receiver));

        let mut record_tasks = JoinSet::new();
        for (record_index, record) in records.iter().cloned().enumerate() {
            let resolver = self.resolver.clone();
            let sender = sender.clone();
            let batch_token = batch_token.clone();
            let link_prefix = self.config.track_link_prefix.clone();
            record_tasks.spawn(async move {
                let record =
                    resolve_record(resolver, record_index, record, sender, batch_token, link_prefix)
                        .await;
                (record_index, record)
            });
        }
        drop(sender);

        while let Some(joined) = record_tasks.join_next().await {
            match joined {
                Ok((record_index, resolved_record)) => records[record_index] = resolved_record,
                Err(error) => log::error!("Record task failed: {}", error),
            }
        }

        let collected = match collector.await {
            Ok(collected) => collected,
            Err(error) => {
                log::error!("Outcome collector failed: {}", error);
                Collected::default()
            }
        };

        let found = collected.resolved.len();
        let mut not_found = collected.not_found;
        not_found.sort();
        let report = BatchReport {
            records,
            track_ids: playlist_track_ids(collected.resolved, record_of_the_week),
            aborted: total.saturating_sub(found + not_found.len()),
            not_found,
            total,
            found,
        };

        if let Some((band, track, source)) = collected.failure {
            return Err(BatchError::Catalog {
                band,
                track,
                source,
                partial: Box::new(report),
            });
        }
        if cancel.is_cancelled() && report.aborted > 0 {
            return Err(BatchError::Cancelled {
                partial: Box::new(report),
            });
        }
        Ok(report)
    }
}

/// Resolve every track of one record and write the links back once all of
/// its track tasks have joined.
async fn resolve_record<C: CatalogSearch + 'static>(
    resolver: Arc<Resolver<C>>,
    record_index: usize,
    mut record: Record,
    sender: mpsc::UnboundedSender<TrackOutcome>,
    batch_token: CancellationToken,
    link_prefix: String,
) -> Record {
    log::info!("{} - {}: {}", record.band, record.album_name, record.link);

    let view = Arc::new(record.clone());
    let mut track_tasks = JoinSet::new();
    for (track_index, track) in record.tracks.iter().enumerate() {
        let resolver = resolver.clone();
        let view = view.clone();
        let sender = sender.clone();
        let batch_token = batch_token.clone();
        let track_name = track.track_name.clone();
        let track_band = track.band.clone();
        track_tasks.spawn(async move {
            let outcome = match resolver
                .resolve_track(&view, &track_name, &batch_token)
                .await
            {
                Ok(Some(candidate)) => TrackOutcome::Found(ResolvedItem {
                    track_id: candidate.id,
                    owner_band: view.band.clone(),
                    owner_score: view.score,
                    position: (record_index, track_index),
                }),
                Ok(None) => TrackOutcome::NotFound {
                    band: track_band,
                    track_name,
                },
                // Siblings of a failed or aborted batch are neither found nor missing.
                Err(CatalogError::Cancelled) => return (track_index, None),
                Err(error) => {
                    batch_token.cancel();
                    TrackOutcome::Failed {
                        band: track_band,
                        track_name,
                        error,
                    }
                }
            };

            let track_id = match &outcome {
                TrackOutcome::Found(item) => Some(item.track_id.clone()),
                _ => None,
            };
            if sender.send(outcome).is_err() {
                log::warn!("Outcome collector is gone, dropping result");
            }
            (track_index, track_id)
        });
    }

    while let Some(joined) = track_tasks.join_next().await {
        match joined {
            Ok((track_index, Some(track_id))) => {
                record.tracks[track_index].resolved_link =
                    Some(format!("{}{}", link_prefix, track_id));
            }
            Ok(_) => {}
            Err(error) => log::error!("Track task for {} failed: {}", record.band, error),
        }
    }

    record
}
