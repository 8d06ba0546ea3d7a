use crate::{
    cli::{connect, spinner},
    error, info,
    library::Selection,
    success, warning,
};

pub async fn playlist(
    name: String,
    min_bpm: u32,
    max_bpm: u32,
    uris: Vec<String>,
    exclude: Vec<String>,
) {
    if min_bpm > max_bpm {
        error!("--min-bpm ({}) is above --max-bpm ({})", min_bpm, max_bpm);
    }

    let mut selection = Selection::new();
    for uri in uris {
        selection.select(uri);
    }
    for uri in exclude {
        selection.exclude(uri);
    }

    let selected = selection.effective();
    if selected.is_empty() {
        warning!("Nothing selected");
        return;
    }

    let session = connect().await;
    info!(
        "Building playlist {} from {} items ({}-{} BPM)",
        name,
        selected.len(),
        min_bpm,
        max_bpm
    );

    let pb = spinner("Resolving tracks and tempos...");
    let result = session
        .create_tempo_playlist(&name, &selected, min_bpm..=max_bpm)
        .await;
    pb.finish_and_clear();

    match result {
        Ok(playlist) => {
            if let Some(id) = playlist.id {
                success!(
                    "Playlist {} created with {} tracks (spotify:playlist:{})",
                    name,
                    playlist.tracks.len(),
                    id
                );
            }
        }
        Err(e) => error!("Cannot create playlist. Err: {}", e),
    }
}
