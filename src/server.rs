use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{Res, api, config::Config, types::AuthSession, warning};

/// State handed to the OAuth callback handler.
pub struct CallbackState {
    pub config: Arc<Config>,
    pub session: Mutex<AuthSession>,
}

/// Binds the callback listener.
///
/// Binding happens before the browser opens so a busy port fails the flow
/// immediately instead of after the user has authorized.
pub async fn bind(addr: &str) -> Res<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind callback server on {}: {}", addr, e).into())
}

pub fn router(state: Arc<CallbackState>) -> Router {
    let callback_path = state.config.callback_path();
    let router = Router::new().route("/health", get(api::health));
    let router = if callback_path == "/health" {
        router
    } else {
        router.route(&callback_path, get(api::callback))
    };
    router.layer(Extension(state))
}

pub async fn start_api_server(listener: TcpListener, state: Arc<CallbackState>) {
    let app = router(state);
    if let Err(e) = axum::serve(listener, app).await {
        warning!("Callback server stopped: {}", e);
    }
}
