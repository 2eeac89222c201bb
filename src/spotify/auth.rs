use std::{path::Path, sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{Client, Url};
use tokio::{
    sync::Mutex,
    time::{sleep, timeout},
};

use crate::{
    Res,
    config::Config,
    info,
    management::TokenManager,
    server::{CallbackState, bind, start_api_server},
    success,
    types::{AuthSession, Token, TokenResponse},
    utils, warning,
};

/// How long the interactive flow waits for the browser callback.
const AUTH_TIMEOUT: Duration = Duration::from_secs(120);
/// Upper bound for a single token endpoint request.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Returns a token manager for the configured user.
///
/// Uses the cached token when one exists; expiry is handled lazily by
/// [`TokenManager::get_valid_token`]. Without a usable cache the interactive
/// authorization flow runs once and its token is cached for later runs.
pub async fn authorize(config: &Config) -> Res<TokenManager> {
    match TokenManager::load(&config.token_cache).await {
        Ok(manager) => Ok(manager),
        Err(e) => {
            if config.token_cache.exists() {
                warning!(
                    "Ignoring unreadable token cache {}: {}",
                    config.token_cache.display(),
                    e
                );
            }
            info!("No cached token found, starting Spotify authorization");
            auth(config).await
        }
    }
}

/// Runs the authorization code flow with PKCE.
///
/// 1. Generates the PKCE verifier/challenge pair and a `state` value
/// 2. Binds the local callback server on the redirect URI's address
/// 3. Opens the authorization URL in the default browser
/// 4. Waits for the callback to exchange the code for a token
/// 5. Persists the token to the token cache
///
/// # Errors
///
/// Fails when the callback server cannot bind, the user denies access, the
/// code exchange fails, or no callback arrives within two minutes.
pub async fn auth(config: &Config) -> Res<TokenManager> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let state = utils::generate_state();

    let auth_url = authorization_url(config, &code_challenge, &state)?;

    let shared_state = Arc::new(CallbackState {
        config: Arc::new(config.clone()),
        session: Mutex::new(AuthSession {
            code_verifier,
            state,
            outcome: None,
        }),
    });

    let listener = bind(&config.server_addr).await?;
    let server = tokio::spawn(start_api_server(listener, Arc::clone(&shared_state)));

    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    } else {
        info!("Waiting for authorization in your browser...");
    }

    let outcome = wait_for_token(&shared_state, AUTH_TIMEOUT).await;
    server.abort();

    let token = match outcome {
        Some(Ok(token)) => token,
        Some(Err(e)) => return Err(format!("Authentication failed: {}", e).into()),
        None => return Err("Authentication failed or timed out.".into()),
    };

    let token_manager = TokenManager::new(token, config.token_cache.clone());
    token_manager
        .persist()
        .await
        .map_err(|e| format!("Failed to save token to cache: {}", e))?;

    success!("Authentication successful!");
    Ok(token_manager)
}

/// Builds the Spotify authorization URL for one PKCE request.
pub fn authorization_url(config: &Config, code_challenge: &str, state: &str) -> Res<Url> {
    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("state", state),
            ("scope", config.scope.as_str()),
        ],
    )?;
    Ok(url)
}

/// Polls the callback session until an outcome arrives or `max_wait` passes.
///
/// Returns `None` on timeout, including when the session lock itself cannot
/// be taken in time.
pub async fn wait_for_token(
    shared_state: &CallbackState,
    max_wait: Duration,
) -> Option<Result<Token, String>> {
    timeout(max_wait, async {
        loop {
            let session = shared_state.session.lock().await;
            if let Some(outcome) = &session.outcome {
                return outcome.clone();
            }
            drop(session);
            sleep(Duration::from_millis(500)).await;
        }
    })
    .await
    .ok()
}

/// Exchanges an authorization code for a token.
///
/// The client secret goes in the Basic auth header; the PKCE verifier binds
/// the exchange to the request that produced the code.
pub async fn exchange_code(config: &Config, code: &str, verifier: &str) -> Result<Token, String> {
    request_token(
        config,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ],
        None,
    )
    .await
}

/// Exchanges a refresh token for a fresh access token.
///
/// Spotify may or may not rotate the refresh token; when the response has
/// none, the one passed in is kept.
pub async fn refresh_token(config: &Config, refresh_token: &str) -> Result<Token, String> {
    request_token(
        config,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
        Some(refresh_token),
    )
    .await
}

async fn request_token(
    config: &Config,
    form: &[(&str, &str)],
    previous_refresh_token: Option<&str>,
) -> Result<Token, String> {
    let client = Client::builder()
        .timeout(TOKEN_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())?;
    let res = client
        .post(&config.token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(format!("token endpoint returned {}: {}", status, body));
    }

    let json: TokenResponse = res.json().await.map_err(|e| e.to_string())?;

    Ok(Token {
        access_token: json.access_token,
        refresh_token: json
            .refresh_token
            .or_else(|| previous_refresh_token.map(str::to_string))
            .unwrap_or_default(),
        scope: json.scope.unwrap_or_default(),
        expires_in: json.expires_in,
        obtained_at: Utc::now().timestamp().max(0) as u64,
    })
}

/// True when a token cache exists at `path`.
pub fn has_cached_token(path: &Path) -> bool {
    path.is_file()
}
