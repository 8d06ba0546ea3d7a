use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot};

use crate::{
    api::{CallbackState, PendingConsent},
    config::Config,
    info,
    server::start_api_server,
    spotify::auth::{AuthorizationRequest, ConsentOutcome, ConsentPrompt},
    warning,
};

/// Consent through the system browser, with the redirect caught by the local
/// callback server.
pub struct BrowserConsent {
    server_addr: String,
    timeout: Duration,
    open_browser: bool,
}

impl BrowserConsent {
    pub fn new(server_addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server_addr: server_addr.into(),
            timeout,
            open_browser: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.server_addr.clone(), config.consent_timeout)
    }

    /// Only print the consent URL instead of launching a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

#[async_trait]
impl ConsentPrompt for BrowserConsent {
    async fn prompt(&self, request: &AuthorizationRequest, url: &str) -> ConsentOutcome {
        let (sender, receiver) = oneshot::channel();
        let state: CallbackState = Arc::new(Mutex::new(Some(PendingConsent {
            state: request.state.clone(),
            sender,
        })));

        let server = match start_api_server(&self.server_addr, state).await {
            Ok(server) => server,
            Err(e) => {
                warning!("{}", e);
                return ConsentOutcome::Dismissed;
            }
        };

        if !self.open_browser || webbrowser::open(url).is_err() {
            warning!(
                "Please navigate to the following URL to authorize sporbpm:\n{}",
                url
            );
        }

        let outcome = match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => ConsentOutcome::Dismissed,
            Err(_) => {
                info!("No authorization received within {}s", self.timeout.as_secs());
                ConsentOutcome::Dismissed
            }
        };

        server.stop().await;
        outcome
    }
}
