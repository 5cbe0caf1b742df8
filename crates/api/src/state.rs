//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Repositories;
use crate::services::auth::TokenCodec;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    repos: Repositories,
    tokens: TokenCodec,
}

impl AppState {
    /// Build the state, deriving the token codec from the configured secret.
    #[must_use]
    pub fn new(config: ApiConfig, repos: Repositories) -> Self {
        let tokens = TokenCodec::new(&config.token_secret);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                tokens,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Codec for issuing and verifying session tokens.
    #[must_use]
    pub fn tokens(&self) -> &TokenCodec {
        &self.inner.tokens
    }
}
