use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::{sync::Mutex, time::sleep};

use crate::{Res, config::Config, management::TokenManager, spotify::auth, warning};

/// Retries for rate-limited or gateway-failed requests.
const MAX_RETRIES: u32 = 3;
/// Longest `Retry-After` the client is willing to sleep through.
const MAX_RETRY_AFTER_SECS: u64 = 120;
const GATEWAY_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Authenticated Spotify Web API client.
///
/// Every request goes through [`SpotifyClient::send`], which attaches a
/// valid bearer token and applies the default resilience rules:
/// `Retry-After` on 429, short retries on 502/503 and a single token refresh
/// on 401.
pub struct SpotifyClient {
    http: Client,
    config: Config,
    tokens: Mutex<TokenManager>,
}

impl SpotifyClient {
    pub fn new(config: Config, tokens: TokenManager) -> Self {
        SpotifyClient {
            http: Client::new(),
            config,
            tokens: Mutex::new(tokens),
        }
    }

    /// Authenticates (cached token or interactive flow) and builds a client.
    pub async fn connect(config: Config) -> Res<Self> {
        let tokens = auth::authorize(&config).await?;
        Ok(Self::new(config, tokens))
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    async fn access_token(&self) -> Res<String> {
        self.tokens.lock().await.get_valid_token(&self.config).await
    }

    pub(crate) async fn send<F>(&self, build: F) -> Res<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retries = 0;
        let mut refreshed = false;

        loop {
            let token = self.access_token().await?;
            let response = build(&self.http).bearer_auth(&token).send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            match status {
                StatusCode::UNAUTHORIZED if !refreshed => {
                    refreshed = true;
                    self.tokens.lock().await.refresh(&self.config).await?;
                    continue;
                }
                StatusCode::TOO_MANY_REQUESTS if retries < MAX_RETRIES => {
                    let retry_after = retry_after_secs(&response).unwrap_or(1);
                    if retry_after > MAX_RETRY_AFTER_SECS {
                        return Err(format!(
                            "Rate limited by Spotify for {} seconds. Try again later.",
                            retry_after
                        )
                        .into());
                    }
                    retries += 1;
                    warning!("Rate limited, retrying in {} seconds", retry_after);
                    sleep(Duration::from_secs(retry_after)).await;
                    continue;
                }
                StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE
                    if retries < MAX_RETRIES =>
                {
                    retries += 1;
                    sleep(GATEWAY_RETRY_DELAY).await;
                    continue;
                }
                _ => {}
            }

            let body = response.text().await.unwrap_or_default();
            return Err(format!("Spotify API returned {}: {}", status, body).into());
        }
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}
