use crate::{config::Config, error, info, spotify};

/// Runs the interactive authorization and replaces any cached token.
pub async fn auth() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    if spotify::auth::has_cached_token(&config.token_cache) {
        info!(
            "Replacing cached token at {}",
            config.token_cache.display()
        );
    }

    if let Err(e) = spotify::auth::auth(&config).await {
        error!("{}", e);
    }
}
