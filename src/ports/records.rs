use color_eyre::eyre::Result;

use crate::services::highlights::types::Record;

/// Port for the crawler that provides this week's reviewed records.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    async fn weekly_records(&self) -> Result<Vec<Record>>;

    /// Band name of the designated record of the week.
    async fn record_of_the_week_band(&self) -> Result<String>;
}
