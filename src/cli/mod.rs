//! Command handlers for the `sporbpm` binary.
//!
//! Each handler builds its own [`Session`], prints its results and terminates
//! the process through `error!` on fatal failures.

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::Config,
    error, info,
    management::FileCredentialStore,
    session::Session,
    spotify::consent::BrowserConsent,
};

mod auth;
mod library;
mod playback;
mod playlist;
mod tempo;

pub use auth::{auth, logout};
pub use library::library;
pub use playback::play;
pub use playlist::playlist;
pub use tempo::tempo;

/// Composition root: configuration, durable store and browser consent.
pub(crate) fn build_session() -> Session {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };
    let consent = Arc::new(BrowserConsent::from_config(&config));
    let store = Arc::new(FileCredentialStore::default_location());
    Session::new(config, store, consent)
}

/// A connected session: silently from the stored refresh token if possible,
/// interactively otherwise.
pub(crate) async fn connect() -> Session {
    let session = build_session();
    if session.reconnect_silently().await {
        return session;
    }

    info!("No usable stored login, starting authorization");
    if !session.login().await {
        error!("Authorization failed. Please run sporbpm auth");
    }
    session
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
