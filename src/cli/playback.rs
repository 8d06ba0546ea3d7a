use crate::{cli::connect, error, success};

/// Resumes playback, or plays `uris` (albums and playlists are expanded to
/// their tracks).
pub async fn play(uris: Vec<String>) {
    let session = connect().await;

    let result = if uris.is_empty() {
        session.resume_playback().await
    } else {
        let tracks = match session.resolve_items_from_uris(&uris).await {
            Ok(tracks) => tracks,
            Err(e) => error!("Cannot resolve tracks. Err: {}", e),
        };
        let track_uris: Vec<String> = tracks.iter().map(|t| t.uri()).collect();
        session.play_tracks(&track_uris).await
    };

    match result {
        Ok(true) => success!("Playback started"),
        Ok(false) => {}
        Err(e) => error!("Cannot start playback. Err: {}", e),
    }
}
