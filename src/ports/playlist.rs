use color_eyre::eyre::Result;

/// Port for the playlist that receives the resolved tracks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaylistWriter: Send + Sync {
    /// Replace the playlist contents. An empty slice clears it.
    async fn replace_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
