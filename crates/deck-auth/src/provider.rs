use async_trait::async_trait;

use crate::error::{AuthError, AuthResult};

/// Supplies a bearer token to whoever is about to make a request. Every
/// credential source in this crate (a literal token, the environment, a
/// completed OAuth flow, a service-account exchange) implements this the
/// same way so `deck-remote` never needs to know which one it was handed.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn token(&self) -> AuthResult<String>;
}

/// A token supplied directly, e.g. from a CLI flag or a CI secret. Never
/// expires and never refreshes.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn token(&self) -> AuthResult<String> {
        Ok(self.0.clone())
    }
}

/// Reads a token from the process environment on every call, so a rotating
/// secret injected by the surrounding environment (a CI job, a sidecar) is
/// picked up without restarting the process.
pub struct AmbientCredentials {
    env_var: String,
}

impl AmbientCredentials {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }
}

impl Default for AmbientCredentials {
    fn default() -> Self {
        Self::new("DECK_ACCESS_TOKEN")
    }
}

#[async_trait]
impl CredentialProvider for AmbientCredentials {
    async fn token(&self) -> AuthResult<String> {
        std::env::var(&self.env_var).map_err(|_| AuthError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_always_returns_the_same_value() {
        let provider = StaticToken::new("fixed");
        assert_eq!(provider.token().await.unwrap(), "fixed");
    }

    #[tokio::test]
    async fn ambient_credentials_reads_the_named_variable() {
        // SAFETY: test-local env var, no concurrent readers of this key in
        // this process.
        unsafe { std::env::set_var("DECK_TEST_TOKEN_VAR", "from-env") };
        let provider = AmbientCredentials::new("DECK_TEST_TOKEN_VAR");
        assert_eq!(provider.token().await.unwrap(), "from-env");
        unsafe { std::env::remove_var("DECK_TEST_TOKEN_VAR") };
    }

    #[tokio::test]
    async fn ambient_credentials_errors_when_unset() {
        let provider = AmbientCredentials::new("DECK_TEST_TOKEN_VAR_UNSET");
        assert!(matches!(
            provider.token().await,
            Err(AuthError::NotAuthenticated)
        ));
    }
}
