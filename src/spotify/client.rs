use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use backon::Retryable;
use futures::{StreamExt, TryStreamExt, stream};
use reqwest::{
    Client, Method, Response, StatusCode,
    header::{CONTENT_TYPE, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{RwLock, Semaphore};

use crate::{
    config::Config,
    error::{Result, SessionError},
    management::TokenManager,
    spotify::retry::BackoffPolicy,
    types::Paging,
    utils, warning,
};

/// Why a single attempt failed.
#[derive(Debug)]
enum AttemptError {
    /// The API answered with a non-2xx status.
    Status(u16),
    /// The request never got an answer.
    Transport(String),
    /// Not worth retrying, e.g. no access token could be produced.
    Fatal(SessionError),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        !matches!(self, AttemptError::Fatal(_))
    }
}

/// Bearer-authenticated access to the Spotify Web API.
///
/// Requests share one pool of `max_concurrent_requests` permits, so nested
/// fan-out (a playlist drained while other URIs resolve) stays under the same
/// cap.
pub struct ApiClient {
    config: Arc<Config>,
    http: Client,
    tokens: Arc<TokenManager>,
    backoff: BackoffPolicy,
    market: RwLock<Option<String>>,
    in_flight: Semaphore,
}

impl ApiClient {
    pub fn new(config: Arc<Config>, http: Client, tokens: Arc<TokenManager>) -> Self {
        let backoff = BackoffPolicy::new(config.retry);
        let in_flight = Semaphore::new(config.max_concurrent_requests);
        Self {
            config,
            http,
            tokens,
            backoff,
            market: RwLock::new(None),
            in_flight,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn market(&self) -> Option<String> {
        self.market.read().await.clone()
    }

    pub async fn set_market(&self, market: Option<String>) {
        *self.market.write().await = market;
    }

    /// Appends the cached market, if any, to `path`.
    pub async fn with_market(&self, path: &str) -> String {
        match self.market().await {
            Some(market) => utils::with_query(path, "market", &market),
            None => path.to_string(),
        }
    }

    /// Sends `method path` with an optional JSON body.
    ///
    /// Every non-2xx answer and every transport failure is retried with
    /// exponential backoff. The access token is fetched again for each attempt,
    /// so a refresh happening in between is picked up.
    pub async fn execute_request(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.config.api_url, path);
        let url = url.as_str();
        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;

        let result = (|| {
            let method = method.clone();
            async move {
                attempts_ref.fetch_add(1, Ordering::SeqCst);
                self.attempt(method, url, body).await
            }
        })
        .retry(self.backoff.builder())
        .sleep(tokio::time::sleep)
        .when(AttemptError::is_retryable)
        .notify(|e: &AttemptError, delay: Duration| {
            warning!(
                "{} {} attempt {} failed ({}), retrying in {:?}",
                method,
                path,
                attempts_ref.load(Ordering::SeqCst),
                describe(e),
                delay
            );
        })
        .await;

        result.map_err(|e| match e {
            AttemptError::Fatal(e) => e,
            AttemptError::Status(status) => SessionError::RetryExhausted {
                method: method.to_string(),
                path: path.to_string(),
                attempts: attempts.load(Ordering::SeqCst),
                last_status: Some(status),
            },
            AttemptError::Transport(_) => SessionError::RetryExhausted {
                method: method.to_string(),
                path: path.to_string(),
                attempts: attempts.load(Ordering::SeqCst),
                last_status: None,
            },
        })
    }

    async fn attempt(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Response, AttemptError> {
        let token = self
            .tokens
            .get_access_token()
            .await
            .map_err(AttemptError::Fatal)?;

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&token)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.json(body);
        }

        let permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;
        let response = request
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;
        drop(permit);

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            // The next attempt refreshes instead of resending a rejected token.
            self.tokens.invalidate(&token).await;
        }
        Err(AttemptError::Status(status.as_u16()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute_request(path, Method::GET, None).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: &Value,
    ) -> Result<T> {
        let response = self.execute_request(path, method, Some(body)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Collects every item of a `limit`/`offset` paged collection.
    ///
    /// The first page reports the total; the remaining pages are then requested
    /// with at most `max_concurrent_requests` in flight and concatenated in
    /// offset order. An empty page ends the collection early even if the
    /// reported total was not reached.
    pub async fn drain_paginated<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let limit = self.config.page_size;
        let first: Paging<T> = self.get_json(&page_path(path, limit, 0)).await?;
        let total = first.total;
        let mut items = first.items;

        if items.is_empty() || items.len() as u32 >= total {
            return Ok(items);
        }

        let offsets = (limit..total).step_by(limit as usize);
        let pages: Vec<Paging<T>> = stream::iter(offsets)
            .map(|offset| {
                let page = page_path(path, limit, offset);
                async move { self.get_json::<Paging<T>>(&page).await }
            })
            .buffered(self.config.max_concurrent_requests)
            .try_collect()
            .await?;

        for page in pages {
            if page.items.is_empty() {
                break;
            }
            items.extend(page.items);
        }
        Ok(items)
    }
}

fn page_path(path: &str, limit: u32, offset: u32) -> String {
    let path = utils::with_query(path, "limit", &limit.to_string());
    utils::with_query(&path, "offset", &offset.to_string())
}

fn describe(e: &AttemptError) -> String {
    match e {
        AttemptError::Status(status) => format!("status {status}"),
        AttemptError::Transport(msg) => msg.clone(),
        AttemptError::Fatal(e) => e.to_string(),
    }
}
