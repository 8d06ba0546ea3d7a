use std::collections::HashMap;

use futures::{StreamExt, TryStreamExt, stream};

use crate::{
    error::Result,
    library::{ItemKind, ItemUri, LibraryItem},
    spotify::client::ApiClient,
    types::{
        AlbumObject, AudioFeaturesResponse, PlaylistObject, SavedAlbumItem, TrackItem,
        TrackObject, UserProfile,
    },
    utils,
};

/// Profile of the logged-in user; `country` is the market used for catalog lookups.
pub async fn current_user(api: &ApiClient) -> Result<UserProfile> {
    api.get_json("/me").await
}

/// Albums saved in the user's library.
pub async fn saved_albums(api: &ApiClient) -> Result<Vec<LibraryItem>> {
    let path = api.with_market("/me/albums").await;
    let items: Vec<SavedAlbumItem> = api.drain_paginated(&path).await?;

    Ok(items
        .into_iter()
        .filter_map(|item| item.album)
        .filter_map(LibraryItem::from_album)
        .collect())
}

/// Playlists the user owns or follows.
pub async fn saved_playlists(api: &ApiClient) -> Result<Vec<LibraryItem>> {
    let items: Vec<PlaylistObject> = api.drain_paginated("/me/playlists").await?;
    Ok(items.into_iter().filter_map(LibraryItem::from_playlist).collect())
}

/// Liked tracks.
pub async fn saved_tracks(api: &ApiClient) -> Result<Vec<LibraryItem>> {
    let path = api.with_market("/me/tracks").await;
    let items: Vec<TrackItem> = api.drain_paginated(&path).await?;
    Ok(tracks_from_items(items))
}

/// Resolves album, playlist and track URIs to their tracks.
///
/// Up to `max_concurrent_requests` URIs are resolved at a time, and results
/// are merged in the order the URIs were given. Duplicate track ids are removed, keeping the first occurrence.
pub async fn resolve_items_from_uris(api: &ApiClient, uris: &[String]) -> Result<Vec<LibraryItem>> {
    let parsed = uris
        .iter()
        .map(|uri| ItemUri::parse(uri))
        .collect::<Result<Vec<_>>>()?;

    let resolved: Vec<Vec<LibraryItem>> = stream::iter(&parsed)
        .map(|uri| resolve_uri(api, uri))
        .buffered(api.config().max_concurrent_requests)
        .try_collect()
        .await?;

    let mut tracks: Vec<LibraryItem> = resolved.into_iter().flatten().collect();
    utils::dedup_by_key(&mut tracks, |t| t.id.clone());
    Ok(tracks)
}

async fn resolve_uri(api: &ApiClient, uri: &ItemUri) -> Result<Vec<LibraryItem>> {
    match uri.kind {
        ItemKind::Album => album_tracks(api, &uri.id).await,
        ItemKind::Playlist => playlist_tracks(api, &uri.id).await,
        ItemKind::Track => {
            let path = api.with_market(&format!("/tracks/{}", uri.id)).await;
            let track: TrackObject = api.get_json(&path).await?;
            Ok(LibraryItem::from_track(track, None).into_iter().collect())
        }
    }
}

/// The album track listing carries no album object, so the cover art comes
/// from a separate album lookup.
async fn album_tracks(api: &ApiClient, album_id: &str) -> Result<Vec<LibraryItem>> {
    let album_path = api.with_market(&format!("/albums/{album_id}")).await;
    let tracks_path = api.with_market(&format!("/albums/{album_id}/tracks")).await;

    let album: AlbumObject = api.get_json(&album_path).await?;
    let image = album
        .images
        .and_then(|images| images.into_iter().next())
        .map(|image| image.url);

    let tracks: Vec<TrackObject> = api.drain_paginated(&tracks_path).await?;
    Ok(tracks
        .into_iter()
        .filter_map(|track| LibraryItem::from_track(track, image.as_deref()))
        .collect())
}

async fn playlist_tracks(api: &ApiClient, playlist_id: &str) -> Result<Vec<LibraryItem>> {
    let path = api
        .with_market(&format!("/playlists/{playlist_id}/tracks"))
        .await;
    let items: Vec<TrackItem> = api.drain_paginated(&path).await?;
    Ok(tracks_from_items(items))
}

fn tracks_from_items(items: Vec<TrackItem>) -> Vec<LibraryItem> {
    items
        .into_iter()
        .filter_map(|item| item.track)
        .filter_map(|track| LibraryItem::from_track(track, None))
        .collect()
}

/// Looks up the tempo of each track id, in batches of `tempo_batch_size`.
///
/// Ids the service has no audio features for (local files, for instance) are
/// left out of the result.
pub async fn lookup_tempos(api: &ApiClient, track_ids: &[String]) -> Result<HashMap<String, u32>> {
    let mut tempos = HashMap::with_capacity(track_ids.len());

    for batch in track_ids.chunks(api.config().tempo_batch_size) {
        let path = utils::with_query("/audio-features", "ids", &batch.join(","));
        let response: AudioFeaturesResponse = api.get_json(&path).await?;

        for feature in response.audio_features.into_iter().flatten() {
            if let Some(tempo) = feature.tempo {
                tempos.insert(feature.id, tempo.round() as u32);
            }
        }
    }

    Ok(tempos)
}
