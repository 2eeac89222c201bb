use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};

use crate::{server::CallbackState, spotify, warning};

/// Handles the OAuth redirect.
///
/// The session lock is released while the code is exchanged, so the
/// waiting side can still give up after its deadline.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<CallbackState>>,
) -> Html<&'static str> {
    let verifier = {
        let mut session = shared_state.session.lock().await;
        if session.outcome.is_some() {
            return Html("<h4>Authorization already handled.</h4>");
        }

        if params.get("state") != Some(&session.state) {
            return Html("<h4>Invalid authorization state.</h4>");
        }

        if let Some(error) = params.get("error") {
            session.outcome = Some(Err(format!("authorization denied: {}", error)));
            return Html("<h4>Authorization denied.</h4>");
        }

        session.code_verifier.clone()
    };

    let Some(code) = params.get("code") else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    let result = spotify::auth::exchange_code(&shared_state.config, code, &verifier).await;

    let mut session = shared_state.session.lock().await;
    if session.outcome.is_some() {
        return Html("<h4>Authorization already handled.</h4>");
    }

    match result {
        Ok(token) => {
            session.outcome = Some(Ok(token));
            Html("<h2>Authentication successful.</h2><p>You can close this browser window.</p>")
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            session.outcome = Some(Err(e));
            Html("<h4>Login failed.</h4>")
        }
    }
}
