use crate::{cli::build_session, error, success};

pub async fn auth() {
    let session = build_session();
    if session.login().await {
        success!("Authentication successful!");
    } else {
        error!("Authentication failed or timed out.");
    }
}

pub async fn logout() {
    let session = build_session();
    match session.logout().await {
        Ok(()) => success!("Stored credentials removed"),
        Err(e) => error!("Failed to remove stored credentials: {}", e),
    }
}
