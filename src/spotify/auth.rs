use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::Config,
    error::{Result, SessionError},
    info,
    management::{
        Credential,
        store::{AUTH_CODE_KEY, CODE_VERIFIER_KEY, CredentialStore},
    },
    types::{TokenErrorResponse, TokenResponse},
    utils, warning,
};

/// One authorization attempt. The verifier must outlive the consent step and is
/// dropped once the code has been exchanged.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub code_verifier: String,
    pub code_challenge: String,
    pub scopes: Vec<String>,
    pub redirect_uri: String,
    /// Echoed back by the authorization server; used to reject stray callbacks.
    pub state: String,
}

impl AuthorizationRequest {
    /// Builds the consent page URL for this request.
    pub fn url(&self, config: &Config) -> String {
        let mut url = format!(
            "{auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&code_challenge={code_challenge}&code_challenge_method=S256&scope={scope}&state={state}",
            auth_url = config.auth_url,
            client_id = urlencoding::encode(&config.client_id),
            redirect_uri = urlencoding::encode(&self.redirect_uri),
            code_challenge = self.code_challenge,
            scope = urlencoding::encode(&self.scopes.join(" ")),
            state = self.state,
        );
        if config.prompt_none {
            url.push_str("&prompt=none");
        }
        url
    }
}

/// How the user left the consent page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentOutcome {
    Approved(String),
    Denied,
    Dismissed,
}

/// Interactive capability that shows the consent page and waits for the user.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn prompt(&self, request: &AuthorizationRequest, url: &str) -> ConsentOutcome;
}

/// Approved authorization code together with the verifier it is bound to.
#[derive(Debug, Clone)]
pub struct AuthorizationGrant {
    pub code: String,
    pub code_verifier: String,
}

/// Drives the authorization-code + PKCE consent step.
pub struct AuthorizationFlow {
    config: Arc<Config>,
    store: Arc<dyn CredentialStore>,
    consent: Arc<dyn ConsentPrompt>,
}

impl AuthorizationFlow {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn CredentialStore>,
        consent: Arc<dyn ConsentPrompt>,
    ) -> Self {
        Self {
            config,
            store,
            consent,
        }
    }

    /// Creates a fresh PKCE pair and request for the given scopes.
    pub fn begin(&self, scopes: &[String]) -> Result<AuthorizationRequest> {
        self.config.validate()?;
        if scopes.is_empty() {
            return Err(SessionError::Config("no scopes requested".into()));
        }

        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);

        Ok(AuthorizationRequest {
            code_verifier,
            code_challenge,
            scopes: scopes.to_vec(),
            redirect_uri: self.config.redirect_uri.clone(),
            state: utils::generate_state(),
        })
    }

    /// Runs the consent step and returns the approved code.
    ///
    /// A denied or dismissed prompt clears any stored code and verifier and
    /// yields [`SessionError::UserCancelled`].
    pub async fn authorize(&self, scopes: &[String]) -> Result<AuthorizationGrant> {
        let request = self.begin(scopes)?;
        let url = request.url(&self.config);

        info!("Waiting for Spotify authorization...");
        match self.consent.prompt(&request, &url).await {
            ConsentOutcome::Approved(code) => {
                // Diagnostics only; a failed write does not void the grant.
                if let Err(e) = self.store.set(AUTH_CODE_KEY, &code).await {
                    warning!("Failed to store authorization code: {}", e);
                }
                if let Err(e) = self.store.set(CODE_VERIFIER_KEY, &request.code_verifier).await {
                    warning!("Failed to store code verifier: {}", e);
                }

                Ok(AuthorizationGrant {
                    code,
                    code_verifier: request.code_verifier,
                })
            }
            outcome => {
                warning!("Authorization not granted ({:?})", outcome);
                self.clear_artifacts().await;
                Err(SessionError::UserCancelled)
            }
        }
    }

    async fn clear_artifacts(&self) {
        for key in [AUTH_CODE_KEY, CODE_VERIFIER_KEY] {
            if let Err(e) = self.store.remove(key).await {
                warning!("Failed to clear {}: {}", key, e);
            }
        }
    }
}

/// Exchanges an approved authorization code for a credential.
pub async fn exchange_code_pkce(
    http: &Client,
    config: &Config,
    grant: &AuthorizationGrant,
) -> Result<Credential> {
    request_token(
        http,
        config,
        &[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", grant.code.as_str()),
            ("code_verifier", grant.code_verifier.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ],
    )
    .await
}

/// Mints a new access credential from a refresh credential.
pub async fn refresh_token(http: &Client, config: &Config, refresh_token: &str) -> Result<Credential> {
    let mut credential = request_token(
        http,
        config,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
        ],
    )
    .await?;

    // Spotify does not always rotate the refresh token.
    if credential.refresh_value.is_none() {
        credential.refresh_value = Some(refresh_token.to_string());
    }
    Ok(credential)
}

async fn request_token(http: &Client, config: &Config, form: &[(&str, &str)]) -> Result<Credential> {
    let response = http
        .post(&config.token_url)
        .form(form)
        .send()
        .await
        .map_err(|e| SessionError::TokenExchangeFailed {
            status: None,
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => match err.error_description {
                Some(desc) => format!("{}: {}", err.error, desc),
                None => err.error,
            },
            Err(_) => body,
        };
        return Err(SessionError::TokenExchangeFailed {
            status: Some(status.as_u16()),
            message,
        });
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| SessionError::TokenExchangeFailed {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

    Ok(Credential::from_response(token, utils::now_epoch_seconds()))
}
