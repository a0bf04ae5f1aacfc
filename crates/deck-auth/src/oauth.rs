//! Interactive OAuth 2.0 authorization-code + PKCE flow with a loopback
//! callback server: the same blocking-server-bridged-to-tokio shape a real
//! CLI OAuth client uses, trimmed to the single `/callback` route this
//! crate needs.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::Method;
use tiny_http::{Response, Server};
use tokio::sync::mpsc;

use deck_transport::Transport;

use crate::error::{AuthError, AuthResult};
use crate::pkce::{generate_state, PkceCodes};
use crate::provider::CredentialProvider;
use crate::storage::{self, CachedToken};

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scope: String,
    pub port: u16,
    pub open_browser: bool,
    pub data_dir: PathBuf,
}

/// Drives the interactive login and caches whatever it obtains; as a
/// [`CredentialProvider`] it only ever serves a cached or refreshed token —
/// `login` has to be called once, out of band, to populate the cache.
pub struct OAuthUserFlow {
    config: OAuthConfig,
    transport: Transport,
    cached: Mutex<Option<CachedToken>>,
}

impl OAuthUserFlow {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            transport: Transport::new(),
            cached: Mutex::new(None),
        }
    }

    /// Runs the full interactive flow: binds the loopback server, opens the
    /// consent page, waits for the redirect, exchanges the code, and caches
    /// the result to disk. Times out after five minutes of no callback.
    pub async fn login(&self) -> AuthResult<CachedToken> {
        let pkce = PkceCodes::generate();
        let state = generate_state();

        let server = bind_server(self.config.port)?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| AuthError::PortBinding {
                port: self.config.port,
                reason: "unable to determine bound port".into(),
            })?;
        let server = Arc::new(server);
        let redirect_uri = format!("http://localhost:{port}/callback");

        let authorize_url = build_authorize_url(&self.config, &redirect_uri, &pkce, &state);
        tracing::info!(target: "deck_auth", port, "waiting for OAuth callback");
        if self.config.open_browser {
            let _ = webbrowser::open(&authorize_url);
        }

        let (tx, mut rx) = mpsc::channel::<tiny_http::Request>(16);
        let server_for_thread = server.clone();
        thread::spawn(move || {
            while let Ok(request) = server_for_thread.recv() {
                if tx.blocking_send(request).is_err() {
                    break;
                }
            }
        });

        let code = tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(300)) => Err(AuthError::Timeout),
            result = wait_for_callback(&mut rx, &state) => result,
        };
        server.unblock();
        let code = code?;

        let token = exchange_code(&self.transport, &self.config, &redirect_uri, &pkce, &code).await?;
        storage::save(&self.config.data_dir, &token)?;
        *self.cached.lock().unwrap() = Some(token.clone());
        Ok(token)
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<CachedToken> {
        let body = serde_json::json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
            "client_id": self.config.client_id,
        });
        let response = self
            .transport
            .request_json(Method::POST, &self.config.token_url, None, Some(&body))
            .await?;
        parse_token_response(response)
    }
}

#[async_trait]
impl CredentialProvider for OAuthUserFlow {
    async fn token(&self) -> AuthResult<String> {
        let mut guard = self.cached.lock().unwrap();
        if guard.is_none() {
            *guard = storage::load(&self.config.data_dir)?;
        }

        if let Some(token) = guard.as_ref() {
            if !token.is_expired(now_unix()) {
                return Ok(token.access_token.clone());
            }
        }

        let refresh_token = guard.as_ref().and_then(|t| t.refresh_token.clone());
        drop(guard);

        let Some(refresh_token) = refresh_token else {
            return Err(AuthError::NotAuthenticated);
        };
        let refreshed = self.refresh(&refresh_token).await?;
        storage::save(&self.config.data_dir, &refreshed)?;
        *self.cached.lock().unwrap() = Some(refreshed.clone());
        Ok(refreshed.access_token)
    }
}

async fn wait_for_callback(
    rx: &mut mpsc::Receiver<tiny_http::Request>,
    state: &str,
) -> AuthResult<String> {
    loop {
        let request = rx.recv().await.ok_or(AuthError::Cancelled)?;
        let url = request.url().to_string();
        let parsed = url::Url::parse(&format!("http://localhost{url}"))
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if parsed.path() != "/callback" {
            let _ = tokio::task::spawn_blocking(move || {
                let _ = request.respond(Response::from_string("not found").with_status_code(404));
            })
            .await;
            continue;
        }

        let params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
        let outcome = if params.get("state").map(String::as_str) != Some(state) {
            Err(AuthError::StateMismatch)
        } else {
            params
                .get("code")
                .filter(|c| !c.is_empty())
                .cloned()
                .ok_or(AuthError::MissingCode)
        };

        let body = match &outcome {
            Ok(_) => "authentication complete, you can close this tab".to_string(),
            Err(e) => format!("authentication failed: {e}"),
        };
        let _ = tokio::task::spawn_blocking(move || {
            let _ = request.respond(Response::from_string(body).with_status_code(200));
        })
        .await;

        return outcome;
    }
}

fn build_authorize_url(
    config: &OAuthConfig,
    redirect_uri: &str,
    pkce: &PkceCodes,
    state: &str,
) -> String {
    let params = [
        ("response_type", "code"),
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", redirect_uri),
        ("scope", config.scope.as_str()),
        ("code_challenge", pkce.challenge.as_str()),
        ("code_challenge_method", "S256"),
        ("state", state),
    ];
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", config.authorize_url, query)
}

async fn exchange_code(
    transport: &Transport,
    config: &OAuthConfig,
    redirect_uri: &str,
    pkce: &PkceCodes,
    code: &str,
) -> AuthResult<CachedToken> {
    let body = serde_json::json!({
        "grant_type": "authorization_code",
        "code": code,
        "redirect_uri": redirect_uri,
        "client_id": config.client_id,
        "code_verifier": pkce.verifier,
    });
    let response = transport
        .request_json(Method::POST, &config.token_url, None, Some(&body))
        .await?;
    parse_token_response(response)
}

pub(crate) fn parse_token_response(response: serde_json::Value) -> AuthResult<CachedToken> {
    let access_token = response
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::TokenExchange("missing access_token".into()))?
        .to_string();
    let refresh_token = response
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .map(String::from);
    let expires_in = response.get("expires_in").and_then(|v| v.as_u64()).unwrap_or(3600);
    Ok(CachedToken {
        access_token,
        refresh_token,
        expires_at: now_unix() + expires_in,
    })
}

pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn bind_server(port: u16) -> AuthResult<Server> {
    let addr = format!("127.0.0.1:{port}");
    const MAX_ATTEMPTS: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_millis(200);
    let mut attempts = 0;

    loop {
        match Server::http(&addr) {
            Ok(server) => return Ok(server),
            Err(e) => {
                attempts += 1;
                let is_addr_in_use = e
                    .downcast_ref::<io::Error>()
                    .map(|e| e.kind() == io::ErrorKind::AddrInUse)
                    .unwrap_or(false);
                if is_addr_in_use && attempts < MAX_ATTEMPTS {
                    tracing::warn!(target: "deck_auth", port, attempts, "callback port in use, retrying");
                    thread::sleep(RETRY_DELAY);
                    continue;
                }
                return Err(AuthError::PortBinding {
                    port,
                    reason: e.to_string(),
                });
            }
        }
    }
}
