//! HTTP boundary
//!
//! Thin axum layer over the dialogue composer: the chat route, conversation
//! history management, abbreviation index rebuilds, health check, and the
//! Bearer API-key middleware. Everything behind the routes is injected
//! through [`state::AppState`], built once in `main`.

pub mod auth;
pub mod http;
pub mod state;

pub use auth::{auth_middleware, ConfigKeyVerifier};
pub use http::create_router;
pub use state::AppState;
