use color_eyre::eyre::{Result, WrapErr};

use crate::ports::playlist::PlaylistWriter;

/// Clear the playlist, then add `track_ids` in order.
pub async fn publish_playlist<W: PlaylistWriter + ?Sized>(
    writer: &W,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<()> {
    writer
        .replace_tracks(playlist_id, &[])
        .await
        .wrap_err(format!("Failed to clear playlist {}", playlist_id))?;

    if track_ids.is_empty() {
        log::info!("no tracks to add");
        return Ok(());
    }

    log::info!("Adding {} tracks to playlist {}", track_ids.len(), playlist_id);
    writer
        .add_tracks(playlist_id, track_ids)
        .await
        .wrap_err(format!("Failed to add tracks to playlist {}", playlist_id))
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::eyre;
    use mockall::Sequence;

    use super::*;
    use crate::ports::playlist::MockPlaylistWriter;

    #[tokio::test]
    async fn test_clears_then_adds_in_order() {
        let mut seq = Sequence::new();
        let mut writer = MockPlaylistWriter::new();
        writer
            .expect_replace_tracks()
            .withf(|playlist_id: &str, track_ids: &[String]| {
                playlist_id == "weekly" && track_ids.is_empty()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        writer
            .expect_add_tracks()
            .withf(|playlist_id: &str, track_ids: &[String]| {
                playlist_id == "weekly" && track_ids == ["b".to_string(), "a".to_string()]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let ids = vec!["b".to_string(), "a".to_string()];
        publish_playlist(&writer, "weekly", &ids).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_list_only_clears() {
        let mut writer = MockPlaylistWriter::new();
        writer
            .expect_replace_tracks()
            .times(1)
            .returning(|_, _| Ok(()));
        writer.expect_add_tracks().never();

        publish_playlist(&writer, "weekly", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_failure_skips_add() {
        let mut writer = MockPlaylistWriter::new();
        writer
            .expect_replace_tracks()
            .times(1)
            .returning(|_, _| Err(eyre!("401 Unauthorized")));
        writer.expect_add_tracks().never();

        let ids = vec!["a".to_string()];
        let error = publish_playlist(&writer, "weekly", &ids).await.unwrap_err();
        assert!(format!("{error}").contains("Failed to clear playlist weekly"));
    }
}
