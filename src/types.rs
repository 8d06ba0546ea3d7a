//! Wire schemas for every JSON shape exchanged with the Spotify services, plus
//! the table rows printed by the CLI.
//!
//! Anything the remote side may omit is an `Option` (or defaults to empty) so a
//! partial record never fails a whole listing. Conversion to domain records
//! happens in [`crate::library`] right after parsing.

use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub expires_in: i64,
    /// Not sent by Spotify itself; honoured when a proxy adds it.
    #[serde(default)]
    pub issued_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleArtist {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    #[serde(default)]
    pub artists: Option<Vec<SimpleArtist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedAlbumItem {
    #[serde(default)]
    pub album: Option<AlbumObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistOwner {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    #[serde(default)]
    pub owner: Option<PlaylistOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    /// `null` for locally uploaded files.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Option<Vec<SimpleArtist>>,
    #[serde(default)]
    pub album: Option<AlbumObject>,
}

/// Item of `/me/tracks` and `/playlists/{id}/tracks`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    #[serde(default)]
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeature>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeature {
    pub id: String,
    #[serde(default)]
    pub tempo: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
}

#[derive(Tabled)]
pub struct ItemTableRow {
    pub name: String,
    pub by: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct TempoTableRow {
    pub name: String,
    pub artists: String,
    pub bpm: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_track_without_id_parses() {
        let item: TrackItem = serde_json::from_str(
            r#"{"track": {"id": null, "name": "demo.mp3", "artists": [], "album": null}}"#,
        )
        .unwrap();
        let track = item.track.unwrap();
        assert!(track.id.is_none());
        assert_eq!(track.name.as_deref(), Some("demo.mp3"));
    }

    #[test]
    fn test_audio_features_with_null_entries() {
        let resp: AudioFeaturesResponse = serde_json::from_str(
            r#"{"audio_features": [{"id": "a", "tempo": 120.4}, null]}"#,
        )
        .unwrap();
        assert_eq!(resp.audio_features.len(), 2);
        assert!(resp.audio_features[1].is_none());
    }

    #[test]
    fn test_paging_defaults_when_empty() {
        let page: Paging<SavedAlbumItem> = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_play_request_omits_missing_uris() {
        let body = serde_json::to_value(PlayRequest { uris: None }).unwrap();
        assert_eq!(body, serde_json::json!({}));
    }
}
