//! # API Module
//!
//! HTTP endpoints served by the local OAuth redirect server while an
//! interactive authorization is in progress.
//!
//! ## Endpoints
//!
//! - [`callback`] - receives the redirect from Spotify's authorization page and
//!   forwards the outcome (code, refusal or state mismatch) to the waiting
//!   consent prompt. It does not talk to the token endpoint itself.
//! - [`health`] - reports liveness, the crate version and whether a redirect is
//!   still expected.
//!
//! Both handlers share a [`CallbackState`] through an axum `Extension`.
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use sporbpm::api::{callback, health, CallbackState};
//!
//! let state: CallbackState = Default::default();
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health))
//!     .layer(Extension(state));
//! ```

mod callback;
mod health;

pub use callback::{CallbackState, PendingConsent, callback};
pub use health::health;
