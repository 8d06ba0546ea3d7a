//! # Spotify Integration Module
//!
//! Everything that talks to Spotify: the OAuth authorization flow, the token
//! endpoint and the Web API.
//!
//! ```text
//! Session (session.rs)
//!     ├── management::TokenManager ── auth (PKCE flow, token endpoint)
//!     │                                 └── consent (browser + callback server)
//!     └── client::ApiClient ───────── retry (backoff policy)
//!             ├── library   saved items, URI resolution, tempo lookup
//!             ├── playlist  playlist creation
//!             └── player    device discovery, playback
//! ```
//!
//! ## Conventions
//!
//! - Functions in [`library`], [`playlist`] and [`player`] are free async
//!   functions taking an [`client::ApiClient`].
//! - All of them return [`crate::error::Result`]. A call that keeps failing ends
//!   in [`crate::error::SessionError::RetryExhausted`], a session without a usable
//!   token in [`crate::error::SessionError::AuthUnavailable`].
//! - JSON is parsed into the schemas of [`crate::types`] and converted to
//!   [`crate::library::LibraryItem`] right away.
//!
//! ## API Coverage
//!
//! - `GET /me`, `GET /me/albums`, `GET /me/playlists`, `GET /me/tracks`
//! - `GET /albums/{id}`, `GET /albums/{id}/tracks`, `GET /playlists/{id}/tracks`, `GET /tracks/{id}`
//! - `GET /audio-features?ids=`
//! - `POST /users/{user_id}/playlists`, `POST /playlists/{playlist_id}/tracks`
//! - `GET /me/player/devices`, `PUT /me/player/play`
//! - `POST /api/token` on the accounts service

pub mod auth;
pub mod client;
pub mod consent;
pub mod library;
pub mod player;
pub mod playlist;
pub mod retry;
