//! Account session — server-side logout and post-logout navigation.
//!
//! Logout is best-effort: the server call may fail (offline, expired
//! session) but the local sign-out always completes.  Navigation sits
//! behind [`Navigator`] so the interaction controller can be tested without
//! a UI shell.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ServerConfig;

// ---------------------------------------------------------------------------
// AuthError
// ---------------------------------------------------------------------------

/// Errors from the account backend.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("auth request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("auth API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AuthError::Timeout
        } else {
            AuthError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AuthApi trait
// ---------------------------------------------------------------------------

/// Async trait for the account backend.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Invalidate the server-side session.
    async fn logout(&self) -> Result<(), AuthError>;
}

// ---------------------------------------------------------------------------
// HttpAuth
// ---------------------------------------------------------------------------

/// Production backend talking to the application server.
pub struct HttpAuth {
    client: reqwest::Client,
    config: ServerConfig,
}

impl HttpAuth {
    pub fn from_config(config: &ServerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuth {
    async fn logout(&self) -> Result<(), AuthError> {
        let url = format!("{}/api/auth/logout", self.config.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(format!("{status}: {body}")));
        }

        log::info!("server session invalidated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// Destinations the controller can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The sign-in screen, shown after logout.
    SignIn,
    /// The assistant customization screen.
    Customize,
}

/// Seam over whatever hosts the assistant (UI shell, web view).
pub trait Navigator: Send + Sync {
    fn goto(&self, view: View);
}

/// Headless navigator that only records the transition in the log.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn goto(&self, view: View) {
        log::info!("navigating to {view:?}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_builds_without_panic() {
        let _auth = HttpAuth::from_config(&ServerConfig::default());
    }

    /// Verify that `HttpAuth` is object-safe (usable as `dyn AuthApi`).
    #[test]
    fn auth_is_object_safe() {
        let auth: Box<dyn AuthApi> = Box::new(HttpAuth::from_config(&ServerConfig::default()));
        drop(auth);
    }
}
