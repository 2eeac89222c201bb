use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::{Res, config::Config, spotify, types::Token};

/// Seconds before expiry at which a token is already treated as expired.
const EXPIRY_MARGIN_SECS: u64 = 240;

pub struct TokenManager {
    token: Token,
    path: PathBuf,
}

impl TokenManager {
    pub fn new(token: Token, path: PathBuf) -> Self {
        TokenManager { token, path }
    }

    pub async fn load(path: &Path) -> Result<Self, String> {
        let content = async_fs::read_to_string(path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self {
            token,
            path: path.to_path_buf(),
        })
    }

    pub async fn persist(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Returns an access token, refreshing and persisting it first if it is
    /// about to expire.
    pub async fn get_valid_token(&mut self, config: &Config) -> Res<String> {
        if self.is_expired() {
            self.refresh(config).await?;
        }

        Ok(self.token.access_token.clone())
    }

    /// Refreshes the token regardless of its expiry time.
    pub async fn refresh(&mut self, config: &Config) -> Res<String> {
        if self.token.refresh_token.is_empty() {
            return Err("Cached token has no refresh token. Run playlist-fill auth.".into());
        }

        let new_token = spotify::auth::refresh_token(config, &self.token.refresh_token)
            .await
            .map_err(|e| format!("Failed to refresh access token: {}", e))?;
        self.token = new_token;
        self.persist()
            .await
            .map_err(|e| format!("Failed to save refreshed token: {}", e))?;

        Ok(self.token.access_token.clone())
    }

    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp().max(0) as u64;
        let expires_at = self.token.obtained_at.saturating_add(self.token.expires_in);
        now >= expires_at.saturating_sub(EXPIRY_MARGIN_SECS)
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
