use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    error::{Result, SessionError},
    info,
    management::store::{CredentialStore, GRANTED_SCOPES_KEY, REFRESH_TOKEN_KEY},
    spotify::auth::{self as token_endpoint, AuthorizationFlow},
    success,
    types::TokenResponse,
    utils, warning,
};

/// Access credential. The access value and expiry only live in memory; the
/// refresh value is persisted by [`TokenManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_value: String,
    pub expires_at: i64,
    pub refresh_value: Option<String>,
}

impl Credential {
    /// Expiry is `issued_at + expires_in`, with `issued_at` defaulting to `now`.
    pub fn from_response(token: TokenResponse, now: i64) -> Self {
        let issued_at = token.issued_at.unwrap_or(now);
        Self {
            access_value: token.access_token,
            expires_at: issued_at + token.expires_in,
            refresh_value: token.refresh_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

struct Inner {
    state: TokenState,
    credential: Option<Credential>,
}

/// Owns the access credential lifecycle.
///
/// All refresh and authorize sequences run while holding the inner lock, so
/// concurrent callers that find an expired credential wait for the one
/// in-flight sequence instead of starting their own. Every finished sequence
/// bumps `generation`; a caller that waited through one takes its outcome,
/// success or failure, rather than running another.
pub struct TokenManager {
    config: Arc<Config>,
    http: Client,
    store: Arc<dyn CredentialStore>,
    flow: AuthorizationFlow,
    inner: Mutex<Inner>,
    generation: AtomicU64,
}

impl TokenManager {
    pub fn new(
        config: Arc<Config>,
        http: Client,
        store: Arc<dyn CredentialStore>,
        flow: AuthorizationFlow,
    ) -> Self {
        Self {
            config,
            http,
            store,
            flow,
            inner: Mutex::new(Inner {
                state: TokenState::Uninitialized,
                credential: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> TokenState {
        self.inner.lock().await.state
    }

    /// Establishes a credential, by refresh first and by interactive
    /// authorization second unless `refresh_only` is set.
    ///
    /// Returns `false` when no credential could be produced.
    pub async fn initialize(&self, refresh_only: bool) -> bool {
        let mut inner = self.inner.lock().await;
        self.initialize_locked(&mut inner, refresh_only).await
    }

    /// Returns an access token that is not expired at call time, refreshing
    /// (or re-authorizing) first when needed.
    pub async fn get_access_token(&self) -> Result<String> {
        let seen = self.generation.load(Ordering::SeqCst);
        let mut inner = self.inner.lock().await;
        let now = utils::now_epoch_seconds();

        if let Some(credential) = &inner.credential {
            if !credential.is_expired_at(now) {
                return Ok(credential.access_value.clone());
            }
        }

        // Someone else's sequence finished while we waited for the lock and
        // left no usable credential.
        if self.generation.load(Ordering::SeqCst) != seen {
            return Err(SessionError::AuthUnavailable);
        }

        if inner.credential.is_some() {
            info!("Access token expired, refreshing");
        }

        if !self.initialize_locked(&mut inner, false).await {
            return Err(SessionError::AuthUnavailable);
        }

        match &inner.credential {
            Some(credential) if !credential.is_expired_at(utils::now_epoch_seconds()) => {
                Ok(credential.access_value.clone())
            }
            _ => Err(SessionError::AuthUnavailable),
        }
    }

    /// Marks `access_value` as no longer accepted, so the next
    /// [`get_access_token`](Self::get_access_token) refreshes. A credential
    /// that was already replaced is left alone.
    pub async fn invalidate(&self, access_value: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(credential) = inner.credential.as_mut() {
            if credential.access_value == access_value {
                credential.expires_at = i64::MIN;
            }
        }
    }

    /// Drops the in-memory credential and everything persisted for it.
    pub async fn forget(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.credential = None;
        inner.state = TokenState::Uninitialized;
        self.store.remove(REFRESH_TOKEN_KEY).await?;
        self.store.remove(GRANTED_SCOPES_KEY).await
    }

    async fn initialize_locked(&self, inner: &mut Inner, refresh_only: bool) -> bool {
        inner.state = TokenState::Initializing;

        let established = match self.establish(refresh_only).await {
            Ok(credential) => {
                self.persist(&credential).await;
                inner.credential = Some(credential);
                inner.state = TokenState::Ready;
                true
            }
            Err(e) => {
                warning!("Could not obtain an access token: {}", e);
                inner.credential = None;
                inner.state = TokenState::Failed;
                false
            }
        };

        self.generation.fetch_add(1, Ordering::SeqCst);
        established
    }

    async fn establish(&self, refresh_only: bool) -> Result<Credential> {
        let requested = self.requested_scopes();
        let granted = self.read(GRANTED_SCOPES_KEY).await;

        if granted.as_deref() != Some(requested.as_str()) {
            // A refresh token minted for other scopes is never reused.
            if granted.is_some() {
                info!("Requested scopes changed, a new authorization is required");
            }
            if let Err(e) = self.store.remove(REFRESH_TOKEN_KEY).await {
                warning!("Failed to discard stored refresh token: {}", e);
            }
            if refresh_only {
                return Err(SessionError::AuthUnavailable);
            }
        } else if let Some(refresh) = self.read(REFRESH_TOKEN_KEY).await {
            match token_endpoint::refresh_token(&self.http, &self.config, &refresh).await {
                Ok(credential) => return Ok(credential),
                Err(e) => {
                    warning!("Token refresh failed: {}", e);
                    if e.is_rejected_grant() {
                        if let Err(e) = self.store.remove(REFRESH_TOKEN_KEY).await {
                            warning!("Failed to discard stored refresh token: {}", e);
                        }
                    }
                }
            }
        }

        if refresh_only {
            return Err(SessionError::AuthUnavailable);
        }

        let grant = self.flow.authorize(&self.config.scopes).await?;
        let credential = token_endpoint::exchange_code_pkce(&self.http, &self.config, &grant).await?;
        success!("Authorization granted");
        Ok(credential)
    }

    /// Persists the refresh value before the scope snapshot, so an interrupted
    /// write never pairs a stale refresh token with the new scopes.
    async fn persist(&self, credential: &Credential) {
        if let Some(refresh) = &credential.refresh_value {
            if let Err(e) = self.store.set(REFRESH_TOKEN_KEY, refresh).await {
                warning!("Failed to persist refresh token: {}", e);
                return;
            }
        }
        if let Err(e) = self
            .store
            .set(GRANTED_SCOPES_KEY, &self.requested_scopes())
            .await
        {
            warning!("Failed to persist granted scopes: {}", e);
        }
    }

    /// Store read failures count as "absent".
    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warning!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn requested_scopes(&self) -> String {
        self.config.scopes.join(" ")
    }

    #[cfg(test)]
    pub(crate) async fn set_credential(&self, credential: Credential) {
        let mut inner = self.inner.lock().await;
        inner.credential = Some(credential);
        inner.state = TokenState::Ready;
    }
}
