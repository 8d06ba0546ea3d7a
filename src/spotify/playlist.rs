use reqwest::Method;

use crate::{
    error::Result,
    info,
    library::{ItemKind, ItemUri},
    spotify::client::ApiClient,
    spotify::library::current_user,
    types::{AddTrackToPlaylistRequest, CreatePlaylistRequest, CreatePlaylistResponse},
};

const PLAYLIST_DESCRIPTION: &str = "Generated by sporbpm";

/// Creates a playlist named `name` holding `track_ids` in the given order.
///
/// Tracks are added in batches of `playlist_batch_size`. Batches go out one
/// after another, since concurrent adds could interleave.
///
/// Returns the id of the created playlist.
pub async fn create_playlist_from_tracks(
    api: &ApiClient,
    name: &str,
    track_ids: &[String],
) -> Result<String> {
    let user = current_user(api).await?;

    let request = CreatePlaylistRequest {
        name: name.to_string(),
        description: PLAYLIST_DESCRIPTION.to_string(),
        public: true,
        collaborative: false,
    };
    let playlist: CreatePlaylistResponse = api
        .send_json(
            &format!("/users/{}/playlists", user.id),
            Method::POST,
            &serde_json::to_value(&request)?,
        )
        .await?;
    info!("Created playlist {} ({})", name, playlist.id);

    let path = format!("/playlists/{}/tracks", playlist.id);
    for batch in track_ids.chunks(api.config().playlist_batch_size) {
        let body = AddTrackToPlaylistRequest {
            uris: batch
                .iter()
                .map(|id| ItemUri::new(ItemKind::Track, id.as_str()).to_string())
                .collect(),
        };
        api.execute_request(&path, Method::POST, Some(&serde_json::to_value(&body)?))
            .await?;
    }

    Ok(playlist.id)
}
