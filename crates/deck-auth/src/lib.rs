//! Credential acquisition for whatever transport is about to call the
//! remote presentation API. Four interchangeable sources behind one trait:
//! a literal token, the ambient environment, an interactive OAuth user
//! flow, and a service-account JWT exchange.

mod error;
mod oauth;
mod pkce;
mod provider;
mod service_account;
mod storage;
mod xdg;

pub use error::{AuthError, AuthResult};
pub use oauth::{OAuthConfig, OAuthUserFlow};
pub use pkce::{generate_state, PkceCodes};
pub use provider::{AmbientCredentials, CredentialProvider, StaticToken};
pub use service_account::ServiceAccountJwt;
pub use storage::CachedToken;
pub use xdg::{default_config_dir, default_data_dir};
