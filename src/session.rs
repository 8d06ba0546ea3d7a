//! Session facade.
//!
//! A [`Session`] is created once by the composition root (the CLI) and passed
//! by reference to whatever needs Spotify access. It owns the token manager and
//! the API client; nothing in the crate keeps a global session.

use std::{collections::HashMap, ops::RangeInclusive, sync::Arc};

use reqwest::Client;
use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::Result,
    info,
    library::{ItemKind, LibraryItem},
    management::{CredentialStore, TokenManager},
    spotify::{
        auth::{AuthorizationFlow, ConsentPrompt},
        client::ApiClient,
        library, player, playlist,
    },
    warning,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Result of [`Session::create_tempo_playlist`].
#[derive(Debug, Clone)]
pub struct TempoPlaylist {
    /// `None` when no track matched and no playlist was created.
    pub id: Option<String>,
    pub tracks: Vec<LibraryItem>,
}

pub struct Session {
    tokens: Arc<TokenManager>,
    api: ApiClient,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new(
        config: Config,
        store: Arc<dyn CredentialStore>,
        consent: Arc<dyn ConsentPrompt>,
    ) -> Self {
        let config = Arc::new(config);
        let http = Client::new();
        let flow = AuthorizationFlow::new(config.clone(), store.clone(), consent);
        let tokens = Arc::new(TokenManager::new(config.clone(), http.clone(), store, flow));
        let api = ApiClient::new(config, http, tokens.clone());

        Self {
            tokens,
            api,
            state: RwLock::new(SessionState::Disconnected),
        }
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Interactive login. Returns `false` if the user did not grant access or
    /// the token exchange failed.
    pub async fn login(&self) -> bool {
        self.connect(false).await
    }

    /// Reconnects from the stored refresh token without ever prompting.
    pub async fn reconnect_silently(&self) -> bool {
        self.connect(true).await
    }

    async fn connect(&self, refresh_only: bool) -> bool {
        *self.state.write().await = SessionState::Connecting;

        if !self.tokens.initialize(refresh_only).await {
            *self.state.write().await = SessionState::Disconnected;
            return false;
        }

        *self.state.write().await = SessionState::Connected;
        self.resolve_market().await;
        true
    }

    /// Listing calls still work without a market, so a failure is only logged.
    async fn resolve_market(&self) {
        match library::current_user(&self.api).await {
            Ok(user) => {
                if let Some(country) = &user.country {
                    info!("Using market {}", country);
                }
                self.api.set_market(user.country).await;
            }
            Err(e) => warning!("Could not resolve account market: {}", e),
        }
    }

    /// Forgets the stored credentials and disconnects.
    pub async fn logout(&self) -> Result<()> {
        self.tokens.forget().await?;
        self.api.set_market(None).await;
        *self.state.write().await = SessionState::Disconnected;
        Ok(())
    }

    pub async fn saved_items(&self, kind: ItemKind) -> Result<Vec<LibraryItem>> {
        match kind {
            ItemKind::Album => library::saved_albums(&self.api).await,
            ItemKind::Playlist => library::saved_playlists(&self.api).await,
            ItemKind::Track => library::saved_tracks(&self.api).await,
        }
    }

    pub async fn resolve_items_from_uris(&self, uris: &[String]) -> Result<Vec<LibraryItem>> {
        library::resolve_items_from_uris(&self.api, uris).await
    }

    pub async fn lookup_tempos(&self, track_ids: &[String]) -> Result<HashMap<String, u32>> {
        library::lookup_tempos(&self.api, track_ids).await
    }

    /// Looks up and records the tempo of every track in `tracks`.
    pub async fn annotate_tempos(&self, tracks: &mut [LibraryItem]) -> Result<()> {
        let ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
        let tempos = self.lookup_tempos(&ids).await?;
        for track in tracks.iter_mut() {
            if let Some(bpm) = tempos.get(&track.id) {
                track.set_tempo(*bpm);
            }
        }
        Ok(())
    }

    /// Resolves `uris` to tracks, keeps those whose tempo lies in `bpm`, and
    /// saves them as a new playlist in their resolved order.
    pub async fn create_tempo_playlist(
        &self,
        name: &str,
        uris: &[String],
        bpm: RangeInclusive<u32>,
    ) -> Result<TempoPlaylist> {
        let mut tracks = self.resolve_items_from_uris(uris).await?;
        self.annotate_tempos(&mut tracks).await?;

        let tracks: Vec<LibraryItem> = tracks
            .into_iter()
            .filter(|t| t.tempo().is_some_and(|tempo| bpm.contains(&tempo)))
            .collect();

        if tracks.is_empty() {
            warning!(
                "No track between {} and {} BPM, playlist not created",
                bpm.start(),
                bpm.end()
            );
            return Ok(TempoPlaylist { id: None, tracks });
        }

        let ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
        let id = playlist::create_playlist_from_tracks(&self.api, name, &ids).await?;
        Ok(TempoPlaylist {
            id: Some(id),
            tracks,
        })
    }

    pub async fn create_playlist_from_tracks(&self, name: &str, track_ids: &[String]) -> Result<String> {
        playlist::create_playlist_from_tracks(&self.api, name, track_ids).await
    }

    /// Returns `false` when there is no device to play on.
    pub async fn resume_playback(&self) -> Result<bool> {
        player::resume_playback(&self.api).await
    }

    pub async fn play_tracks(&self, uris: &[String]) -> Result<bool> {
        player::play_tracks(&self.api, uris).await
    }
}
