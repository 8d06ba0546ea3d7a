//! Domain records for a user's library.
//!
//! Items are built from the wire schemas in [`crate::types`] and never mutated
//! afterwards, except for a track's tempo which is filled in once after a tempo
//! lookup.

use std::fmt;

use crate::{
    error::{Result, SessionError},
    types::{AlbumObject, Image, PlaylistObject, SimpleArtist, TrackObject},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Album,
    Playlist,
    Track,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Album => "album",
            ItemKind::Playlist => "playlist",
            ItemKind::Track => "track",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a [`LibraryItem`].
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDetails {
    /// `artists` is empty when the service sent no artist list.
    Album { artists: Vec<String> },
    Playlist { owner: Option<String> },
    Track { artists: Vec<String>, tempo: Option<u32> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryItem {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub details: ItemDetails,
}

impl LibraryItem {
    pub fn album(id: String, name: String, image_url: Option<String>, artists: Vec<String>) -> Self {
        Self {
            id,
            name,
            image_url,
            details: ItemDetails::Album { artists },
        }
    }

    pub fn playlist(
        id: String,
        name: String,
        image_url: Option<String>,
        owner: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            image_url,
            details: ItemDetails::Playlist { owner },
        }
    }

    pub fn track(id: String, name: String, image_url: Option<String>, artists: Vec<String>) -> Self {
        Self {
            id,
            name,
            image_url,
            details: ItemDetails::Track {
                artists,
                tempo: None,
            },
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self.details {
            ItemDetails::Album { .. } => ItemKind::Album,
            ItemDetails::Playlist { .. } => ItemKind::Playlist,
            ItemDetails::Track { .. } => ItemKind::Track,
        }
    }

    /// `spotify:{kind}:{id}`
    pub fn uri(&self) -> String {
        ItemUri::new(self.kind(), self.id.clone()).to_string()
    }

    pub fn artists(&self) -> &[String] {
        match &self.details {
            ItemDetails::Album { artists } | ItemDetails::Track { artists, .. } => artists,
            ItemDetails::Playlist { .. } => &[],
        }
    }

    pub fn tempo(&self) -> Option<u32> {
        match self.details {
            ItemDetails::Track { tempo, .. } => tempo,
            _ => None,
        }
    }

    /// Records the tempo of a track. Has no effect on albums and playlists, or
    /// when a tempo was already recorded.
    pub fn set_tempo(&mut self, bpm: u32) {
        if let ItemDetails::Track { tempo, .. } = &mut self.details {
            if tempo.is_none() {
                *tempo = Some(bpm);
            }
        }
    }

    /// Builds an album item. Returns `None` for records without an id.
    pub fn from_album(album: AlbumObject) -> Option<Self> {
        let id = album.id?;
        Some(Self::album(
            id,
            album.name.unwrap_or_default(),
            first_image(album.images),
            artist_names(album.artists),
        ))
    }

    pub fn from_playlist(playlist: PlaylistObject) -> Option<Self> {
        let id = playlist.id?;
        Some(Self::playlist(
            id,
            playlist.name.unwrap_or_default(),
            first_image(playlist.images),
            playlist.owner.and_then(|o| o.display_name),
        ))
    }

    /// Builds a track item, taking the cover art from the embedded album unless
    /// `fallback_image` is given (album track listings carry no album object).
    pub fn from_track(track: TrackObject, fallback_image: Option<&str>) -> Option<Self> {
        let id = track.id?;
        let image_url = match fallback_image {
            Some(url) => Some(url.to_string()),
            None => track.album.and_then(|a| first_image(a.images)),
        };
        Some(Self::track(
            id,
            track.name.unwrap_or_default(),
            image_url,
            artist_names(track.artists),
        ))
    }
}

fn first_image(images: Option<Vec<Image>>) -> Option<String> {
    images.and_then(|images| images.into_iter().next()).map(|i| i.url)
}

fn artist_names(artists: Option<Vec<SimpleArtist>>) -> Vec<String> {
    artists
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.name)
        .collect()
}

/// A parsed item reference.
///
/// Accepts the canonical `spotify:track:ID` form as well as the short
/// `Track:ID` form; the kind is matched case-insensitively. Ids are base62,
/// so anything but ASCII letters and digits is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemUri {
    pub kind: ItemKind,
    pub id: String,
}

impl ItemUri {
    pub fn new(kind: ItemKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn parse(uri: &str) -> Result<Self> {
        let trimmed = uri.trim();
        let rest = match trimmed.split_once(':') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("spotify") => rest,
            _ => trimmed,
        };

        let (kind, id) = rest
            .split_once(':')
            .ok_or_else(|| SessionError::InvalidUri(uri.to_string()))?;

        let kind = match kind.to_ascii_lowercase().as_str() {
            "album" => ItemKind::Album,
            "playlist" => ItemKind::Playlist,
            "track" => ItemKind::Track,
            _ => return Err(SessionError::InvalidUri(uri.to_string())),
        };

        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SessionError::InvalidUri(uri.to_string()));
        }

        Ok(Self::new(kind, id))
    }
}

impl fmt::Display for ItemUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spotify:{}:{}", self.kind, self.id)
    }
}

/// Selected and excluded items, keyed by derived URI.
///
/// Keying by URI is only collision free because the kind is part of the URI.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: Vec<String>,
    excluded: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, uri: impl Into<String>) -> &mut Self {
        let uri = uri.into();
        if !self.selected.contains(&uri) {
            self.selected.push(uri);
        }
        self
    }

    pub fn exclude(&mut self, uri: impl Into<String>) -> &mut Self {
        let uri = uri.into();
        if !self.excluded.contains(&uri) {
            self.excluded.push(uri);
        }
        self
    }

    pub fn is_selected(&self, uri: &str) -> bool {
        self.selected.iter().any(|u| u == uri)
    }

    pub fn is_excluded(&self, uri: &str) -> bool {
        self.excluded.iter().any(|u| u == uri)
    }

    /// Selected URIs that are not excluded, in selection order.
    pub fn effective(&self) -> Vec<String> {
        self.selected
            .iter()
            .filter(|u| !self.is_excluded(u))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaylistOwner;

    #[test]
    fn test_uri_is_derived_from_kind_and_id() {
        let album = LibraryItem::album("abc".into(), "A".into(), None, vec![]);
        assert_eq!(album.uri(), "spotify:album:abc");

        let track = LibraryItem::track("xyz".into(), "T".into(), None, vec![]);
        assert_eq!(track.uri(), "spotify:track:xyz");
    }

    #[test]
    fn test_parse_accepts_both_forms() {
        assert_eq!(
            ItemUri::parse("spotify:playlist:37i9").unwrap(),
            ItemUri::new(ItemKind::Playlist, "37i9")
        );
        assert_eq!(
            ItemUri::parse("Track:A").unwrap(),
            ItemUri::new(ItemKind::Track, "A")
        );
    }

    #[test]
    fn test_parse_rejects_unknown_kind_and_missing_id() {
        assert!(ItemUri::parse("spotify:artist:1").is_err());
        assert!(ItemUri::parse("spotify:track:").is_err());
        assert!(ItemUri::parse("nonsense").is_err());
    }

    #[test]
    fn test_parse_rejects_ids_that_are_not_base62() {
        for uri in [
            "Track:../me",
            "spotify:track:a?b",
            "spotify:album:a&limit=1",
            "spotify:playlist:a/tracks",
            "spotify:track:a:b",
        ] {
            assert!(
                matches!(ItemUri::parse(uri), Err(SessionError::InvalidUri(_))),
                "{uri} was accepted"
            );
        }
    }

    #[test]
    fn test_tempo_set_once() {
        let mut track = LibraryItem::track("1".into(), "T".into(), None, vec![]);
        assert_eq!(track.tempo(), None);
        track.set_tempo(128);
        track.set_tempo(90);
        assert_eq!(track.tempo(), Some(128));
    }

    #[test]
    fn test_missing_optional_fields_become_absent() {
        let playlist = PlaylistObject {
            id: Some("p".into()),
            name: Some("Mix".into()),
            images: None,
            owner: Some(PlaylistOwner { display_name: None }),
        };
        let item = LibraryItem::from_playlist(playlist).unwrap();
        assert_eq!(item.image_url, None);
        assert_eq!(item.details, ItemDetails::Playlist { owner: None });

        let album = AlbumObject {
            id: Some("a".into()),
            name: None,
            images: Some(vec![]),
            artists: None,
        };
        let item = LibraryItem::from_album(album).unwrap();
        assert!(item.artists().is_empty());
        assert_eq!(item.image_url, None);
    }

    #[test]
    fn test_record_without_id_is_skipped() {
        let track = TrackObject {
            id: None,
            name: Some("local.mp3".into()),
            artists: None,
            album: None,
        };
        assert!(LibraryItem::from_track(track, None).is_none());
    }

    #[test]
    fn test_selection_effective_excludes() {
        let mut selection = Selection::new();
        selection
            .select("spotify:album:1")
            .select("spotify:track:2")
            .select("spotify:album:1")
            .exclude("spotify:track:2");

        assert!(selection.is_selected("spotify:track:2"));
        assert_eq!(selection.effective(), vec!["spotify:album:1".to_string()]);
    }
}
