//! API-key authentication

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use report_agent_core::ApiKeyVerifier;

use crate::state::AppState;

/// Warn about disabled auth once, not per request
static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

/// Verifies Bearer keys against the configured key set
pub struct ConfigKeyVerifier {
    keys: Vec<String>,
}

impl ConfigKeyVerifier {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl ApiKeyVerifier for ConfigKeyVerifier {
    async fn verify(&self, key: &str) -> bool {
        self.keys
            .iter()
            .any(|expected| constant_time_compare(key.as_bytes(), expected.as_bytes()))
    }
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Bearer-token middleware.
///
/// Public paths pass through; everything else requires
/// `Authorization: Bearer <api_key>` matching a configured key.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let auth = &state.settings.server.auth;

    if !auth.enabled {
        if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "API authentication is disabled; set REPORT_AGENT__SERVER__AUTH__ENABLED=true \
                 for production"
            );
        }
        return next.run(request).await;
    }

    let path = request.uri().path();
    if auth.public_paths.iter().any(|p| path.starts_with(p)) {
        return next.run(request).await;
    }

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match header_value {
        Some(value) if value.starts_with("Bearer ") => {
            let provided = &value[7..];
            if state.verifier.verify(provided).await {
                next.run(request).await
            } else {
                tracing::warn!("invalid API key");
                (StatusCode::UNAUTHORIZED, "Invalid API key").into_response()
            }
        }
        Some(_) => (
            StatusCode::BAD_REQUEST,
            "Invalid Authorization header format. Expected: Bearer <token>",
        )
            .into_response(),
        None => (StatusCode::UNAUTHORIZED, "Missing Authorization header").into_response(),
    }
}

/// Build a verifier from settings
pub fn verifier_from_settings(settings: &report_agent_config::Settings) -> Arc<dyn ApiKeyVerifier> {
    Arc::new(ConfigKeyVerifier::new(
        settings.server.auth.api_keys.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_compare_basics() {
        assert!(constant_time_compare(b"secret", b"secret"));
        assert!(!constant_time_compare(b"secret", b"secreT"));
        assert!(!constant_time_compare(b"secret", b"secre"));
    }

    #[tokio::test]
    async fn verifier_accepts_any_configured_key() {
        let verifier =
            ConfigKeyVerifier::new(vec!["alpha-key".to_string(), "beta-key".to_string()]);
        assert!(verifier.verify("beta-key").await);
        assert!(!verifier.verify("gamma-key").await);
    }
}
