use std::{net::SocketAddr, str::FromStr};

use axum::{Extension, Router, routing::get};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{
    api::{self, CallbackState},
    error::{Result, SessionError},
    warning,
};

/// A running callback server. Dropping the handle without calling
/// [`ServerHandle::stop`] leaves the server running until the process exits.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address actually bound, useful when the configured port was `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warning!("Callback server task failed: {}", e);
        }
    }
}

pub fn router(state: CallbackState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
}

/// Binds `addr` and serves the callback routes in the background.
pub async fn start_api_server(addr: &str, state: CallbackState) -> Result<ServerHandle> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| SessionError::CallbackServer(format!("invalid address {addr}: {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SessionError::CallbackServer(format!("cannot bind {addr}: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| SessionError::CallbackServer(e.to_string()))?;

    let (shutdown, stopped) = oneshot::channel::<()>();
    let app = router(state);
    let task = tokio::spawn(async move {
        let graceful = async {
            let _ = stopped.await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(graceful)
            .await
        {
            warning!("Callback server stopped: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::PendingConsent, spotify::auth::ConsentOutcome};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn test_callback_round_trip_over_http() {
        let (tx, rx) = oneshot::channel();
        let state: CallbackState = Arc::new(Mutex::new(Some(PendingConsent {
            state: "st".into(),
            sender: tx,
        })));
        let server = start_api_server("127.0.0.1:0", state).await.unwrap();
        let base = format!("http://{}", server.local_addr());

        let health: serde_json::Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["awaiting_callback"], true);

        let page = reqwest::get(format!("{base}/callback?code=the-code&state=st"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("Authentication successful"));
        assert_eq!(rx.await.unwrap(), ConsentOutcome::Approved("the-code".into()));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected() {
        let state: CallbackState = Arc::new(Mutex::new(None));
        assert!(matches!(
            start_api_server("not-an-address", state).await,
            Err(SessionError::CallbackServer(_))
        ));
    }
}
