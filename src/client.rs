use backoff::{backoff::Backoff, ExponentialBackoff};
use log::info;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

static USER_AGENT: &str = "buildwatch";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub type Result<T> = std::result::Result<T, Error>;

/// Builds an HTTP client with the fixed per-request timeout applied to
/// every call.
pub(crate) fn build_http_client(tls_verify: bool) -> Client {
    ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .danger_accept_invalid_certs(!tls_verify)
        .build()
        .unwrap()
}

/// JSON API client authenticating every request with HTTP basic auth.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    username: String,
    password: String,
}

impl ApiClient {
    pub fn from_credentials<U: Into<String>, P: Into<String>>(
        username: U,
        password: P,
        tls_verify: bool,
    ) -> Self {
        Self {
            client: build_http_client(tls_verify),
            username: username.into(),
            password: password.into(),
        }
    }

    pub async fn get<O>(&self, endpoint: &str) -> Result<O>
    where
        O: DeserializeOwned + Debug,
    {
        retry_request_if_needed(|| {
            let builder = self.client.get(endpoint);
            self.submit(builder)
        })
        .await
    }

    async fn submit<O>(&self, builder: RequestBuilder) -> Result<O>
    where
        O: DeserializeOwned,
    {
        let builder = builder.basic_auth(&self.username, Some(&self.password));
        let response = builder.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Error::Http(response.status()))
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("rate limited max attempts reached")]
    RateLimitRetries,

    #[error("request failed with status code {0}")]
    Http(StatusCode),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    pub fn not_found(&self) -> bool {
        matches!(self, Self::Http(StatusCode::NOT_FOUND))
    }

    pub fn too_many_requests(&self) -> bool {
        matches!(self, Self::Http(StatusCode::TOO_MANY_REQUESTS))
    }
}

async fn retry_request_if_needed<F, R, O>(requestor: F) -> Result<O>
where
    F: Fn() -> R,
    R: Future<Output = Result<O>>,
    O: DeserializeOwned + Debug,
{
    let mut backoff = ExponentialBackoff::default();
    loop {
        match requestor().await {
            Err(e) if e.too_many_requests() => {
                let delay = backoff.next_backoff();
                match delay {
                    Some(delay) => {
                        info!("Rate limit hit, sleeping for {}s", delay.as_secs());
                        sleep(delay).await
                    }
                    None => return Err(Error::RateLimitRetries),
                }
            }
            other => return other,
        }
    }
}
