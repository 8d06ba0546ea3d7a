use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::{Mutex, oneshot};

use crate::{spotify::auth::ConsentOutcome, warning};

/// The consent attempt the callback server is waiting for.
pub struct PendingConsent {
    /// `state` sent with the authorization request.
    pub state: String,
    pub sender: oneshot::Sender<ConsentOutcome>,
}

pub type CallbackState = Arc<Mutex<Option<PendingConsent>>>;

/// Handles the redirect from the authorization page and hands the outcome to
/// the waiting consent prompt. The code exchange happens elsewhere.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<CallbackState>,
) -> Html<&'static str> {
    let Some(pending) = shared_state.lock().await.take() else {
        return Html("<h4>No authorization in progress.</h4>");
    };

    let (outcome, page) = classify(&params, &pending.state);
    if pending.sender.send(outcome).is_err() {
        warning!("Authorization callback arrived after the prompt gave up");
    }
    Html(page)
}

fn classify(params: &HashMap<String, String>, expected_state: &str) -> (ConsentOutcome, &'static str) {
    if params.get("state").map(String::as_str) != Some(expected_state) {
        warning!("Rejecting authorization callback with unexpected state");
        return (ConsentOutcome::Denied, "<h4>Login failed: state mismatch.</h4>");
    }

    if let Some(error) = params.get("error") {
        warning!("Authorization was refused: {}", error);
        return (ConsentOutcome::Denied, "<h4>Login cancelled.</h4><p>You can close this window.</p>");
    }

    match params.get("code") {
        Some(code) if !code.is_empty() => (
            ConsentOutcome::Approved(code.clone()),
            "<h2>Authentication successful.</h2><p>You can close this window.</p>",
        ),
        _ => (ConsentOutcome::Denied, "<h4>Missing authorization code.</h4>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn run(pairs: &[(&str, &str)]) -> ConsentOutcome {
        let (tx, rx) = oneshot::channel();
        let state: CallbackState = Arc::new(Mutex::new(Some(PendingConsent {
            state: "s1".into(),
            sender: tx,
        })));
        callback(Query(params(pairs)), Extension(state.clone())).await;
        assert!(state.lock().await.is_none());
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_code_with_matching_state_is_approved() {
        assert_eq!(
            run(&[("code", "abc"), ("state", "s1")]).await,
            ConsentOutcome::Approved("abc".into())
        );
    }

    #[tokio::test]
    async fn test_error_param_is_denied() {
        assert_eq!(
            run(&[("error", "access_denied"), ("state", "s1")]).await,
            ConsentOutcome::Denied
        );
    }

    #[tokio::test]
    async fn test_state_mismatch_is_denied() {
        assert_eq!(
            run(&[("code", "abc"), ("state", "other")]).await,
            ConsentOutcome::Denied
        );
    }

    #[tokio::test]
    async fn test_callback_without_pending_consent() {
        let state: CallbackState = Arc::new(Mutex::new(None));
        let Html(page) = callback(Query(params(&[("code", "x")])), Extension(state)).await;
        assert!(page.contains("No authorization in progress"));
    }
}
