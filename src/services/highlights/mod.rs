pub mod normalize;
pub mod orchestrator;
pub mod ordering;
pub mod resolver;
pub mod scorer;
pub mod types;

use color_eyre::eyre::{Result, WrapErr};
use tokio_util::sync::CancellationToken;

use crate::ports::catalog::CatalogSearch;
use crate::ports::playlist::PlaylistWriter;
use crate::ports::records::RecordSource;
use crate::services::playlist::publish_playlist;
use orchestrator::Orchestrator;
use types::BatchReport;

/// Where the resolved tracks end up. `None` resolves without touching any
/// playlist.
pub struct PublishTarget<'a, W: PlaylistWriter> {
    pub writer: &'a W,
    pub playlist_id: &'a str,
}

/// Load this week's records, resolve them and publish the playlist.
///
/// An aborted batch is returned as an error wrapping
/// [`orchestrator::BatchError`], which still carries the partial report.
pub async fn build_playlist<S, C, W>(
    source: &S,
    orchestrator: &Orchestrator<C>,
    target: Option<PublishTarget<'_, W>>,
    cancel: &CancellationToken,
) -> Result<BatchReport>
where
    S: RecordSource,
    C: CatalogSearch + 'static,
    W: PlaylistWriter,
{
    let records = source
        .weekly_records()
        .await
        .wrap_err("Failed to load weekly records")?;
    let record_of_the_week = source
        .record_of_the_week_band()
        .await
        .wrap_err("Failed to load record of the week")?;
    log::info!("Record of the week: {}", record_of_the_week);

    let report = match orchestrator.run(records, &record_of_the_week, cancel).await {
        Ok(report) => report,
        Err(error) => {
            error.partial_report().log_summary();
            return Err(error.into());
        }
    };
    report.log_summary();

    match target {
        Some(target) => {
            publish_playlist(target.writer, target.playlist_id, &report.track_ids).await?;
            log::info!("Playlist {} updated", target.playlist_id);
        }
        None => log::info!("Dry run, playlist left untouched"),
    }

    Ok(report)
}
