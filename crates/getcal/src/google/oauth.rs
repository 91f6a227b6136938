//! Browser-based Google authorization.
//!
//! OAuth 2.0 authorization-code grant with PKCE (RFC 7636) for a desktop
//! binary: the consent page opens in the user's browser and Google redirects
//! back to a short-lived listener on the loopback interface. The listener
//! accepts exactly one authorization result, then the code is exchanged for
//! tokens. The state parameter ties the redirect to this flow.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::config::OAuthCredentials;
use super::tokens::TokenInfo;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// How long the loopback listener waits for the browser redirect.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// OAuth client for obtaining and refreshing Google tokens.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client with the given credentials.
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            http_client,
        })
    }

    /// Runs the interactive consent flow and returns the obtained tokens.
    ///
    /// A browser-side denial, a state mismatch, and a consent timeout all map
    /// to [`Error::ConsentDenied`].
    pub async fn authorize(
        &self,
        scopes: &[String],
        port_range: (u16, u16),
    ) -> Result<TokenInfo> {
        let pkce = PkceFlow::new();

        let (listener, port) = bind_redirect_listener(port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);
        let url = pkce.consent_url(&self.credentials.client_id, &redirect_uri, scopes);

        info!("waiting for browser consent on port {}", port);
        if let Err(e) = open::that(&url) {
            warn!("could not launch a browser: {}", e);
            eprintln!("\nOpen this URL to authorize getcal:\n\n{}\n", url);
        }

        let (code, state) = match await_redirect(listener)? {
            CallbackOutcome::Granted { code, state } => (code, state),
            CallbackOutcome::Denied { reason } => {
                return Err(Error::ConsentDenied(format!(
                    "authorization denied: {}",
                    reason
                )));
            }
        };

        if state != pkce.state {
            return Err(Error::ConsentDenied(
                "state parameter does not match this flow".into(),
            ));
        }

        debug!("exchanging authorization code for tokens");
        let grant = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code.as_str()),
            ("code_verifier", pkce.verifier.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let granted = self
            .token_request(&grant, |status, body| {
                Error::ConsentDenied(format!("code exchange rejected ({}): {}", status, body))
            })
            .await?;

        info!("consent granted");
        Ok(TokenInfo::new(
            granted.access_token,
            granted.refresh_token,
            granted.expires_in,
            scopes.to_vec(),
        ))
    }

    /// Silently refreshes an expired access token.
    ///
    /// Returns the new access token and its expiry in seconds. A rejected
    /// refresh token (revoked consent) maps to [`Error::CredentialRevoked`].
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<(String, Option<i64>)> {
        let grant = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let granted = self
            .token_request(&grant, |status, body| {
                Error::CredentialRevoked(format!("refresh rejected ({}): {}", status, body))
            })
            .await?;

        debug!("access token refreshed");
        Ok((granted.access_token, granted.expires_in))
    }

    /// Posts one grant to the token endpoint.
    ///
    /// `rejected` turns a non-success status into the caller's error variant;
    /// transport and decoding failures are [`Error::QueryFailed`].
    async fn token_request(
        &self,
        form: &[(&str, &str)],
        rejected: impl FnOnce(reqwest::StatusCode, String) -> Error,
    ) -> Result<TokenGrant> {
        let response = self
            .http_client
            .post(TOKEN_ENDPOINT)
            .form(form)
            .send()
            .await
            .map_err(|e| Error::QueryFailed(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::QueryFailed(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            return Err(rejected(status, body));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::QueryFailed(format!("malformed token response: {}", e)))
    }
}

/// One PKCE exchange: the verifier, its S256 challenge, and the CSRF state.
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkceFlow {
    /// Creates a flow with fresh random secrets.
    pub fn new() -> Self {
        let verifier = random_urlsafe(32);
        let challenge = s256_challenge(&verifier);
        let state = random_urlsafe(16);
        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// Assembles the consent-page URL for this flow.
    pub fn consent_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        let scope = scopes.join(" ");
        let params: [(&str, &str); 9] = [
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", &scope),
            ("code_challenge", &self.challenge),
            ("code_challenge_method", "S256"),
            ("state", &self.state),
            // Google only issues a refresh token for offline access with an
            // explicit consent prompt.
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        format!("{}?{}", AUTH_ENDPOINT, query.join("&"))
    }
}

fn random_urlsafe(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// What the browser redirect carried.
#[derive(Debug, PartialEq, Eq)]
enum CallbackOutcome {
    Granted { code: String, state: String },
    Denied { reason: String },
}

/// Binds the redirect listener to the first free port in the range.
fn bind_redirect_listener(ports: (u16, u16)) -> Result<(TcpListener, u16)> {
    let (low, high) = ports;
    for port in low..=high {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            debug!("redirect listener on 127.0.0.1:{}", port);
            return Ok((listener, port));
        }
    }
    Err(Error::Internal(format!(
        "every loopback port in {}-{} is taken",
        low, high
    )))
}

/// Serves the listener until one authorization result arrives or the consent
/// window elapses.
fn await_redirect(listener: TcpListener) -> Result<CallbackOutcome> {
    let (tx, rx) = mpsc::channel();

    // Accept on a separate thread so the wait can time out.
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            if let Some(outcome) = answer_redirect(stream) {
                let _ = tx.send(outcome);
                break;
            }
        }
    });

    match rx.recv_timeout(CONSENT_TIMEOUT) {
        Ok(outcome) => Ok(outcome),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::ConsentDenied(
            "no browser response within 5 minutes".into(),
        )),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(Error::Internal("redirect listener stopped early".into()))
        }
    }
}

/// Reads one request, answers it, and reports the outcome it carried.
fn answer_redirect(mut stream: TcpStream) -> Option<CallbackOutcome> {
    let mut request_line = String::new();
    if BufReader::new(&stream).read_line(&mut request_line).is_err() {
        return None;
    }

    let outcome = parse_callback(request_line.trim_end())?;
    let page = response_page(&outcome);
    let _ = stream.write_all(page.as_bytes());
    let _ = stream.flush();
    Some(outcome)
}

/// Extracts the authorization result from the redirect request line.
///
/// Returns `None` for anything that is not a `GET` on `/callback` (favicon
/// probes and the like), so the listener keeps waiting.
fn parse_callback(request_line: &str) -> Option<CallbackOutcome> {
    let mut words = request_line.split_whitespace();
    if words.next() != Some("GET") {
        return None;
    }
    let target = words.next()?;
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    };
    if path != "/callback" {
        return None;
    }

    let mut code = None;
    let mut state = None;
    let mut denial = None;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_default();
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => denial = Some(value),
            _ => {}
        }
    }

    if let Some(reason) = denial {
        return Some(CallbackOutcome::Denied { reason });
    }
    match code {
        Some(code) => Some(CallbackOutcome::Granted {
            code,
            state: state.unwrap_or_default(),
        }),
        None => Some(CallbackOutcome::Denied {
            reason: "redirect carried no authorization code".into(),
        }),
    }
}

/// Renders the page shown in the browser after the redirect.
fn response_page(outcome: &CallbackOutcome) -> String {
    let (status, message) = match outcome {
        CallbackOutcome::Granted { .. } => (
            "200 OK",
            "Access granted. You can close this tab and return to getcal.",
        ),
        CallbackOutcome::Denied { .. } => (
            "403 Forbidden",
            "Authorization was not completed. Close this tab and run getcal again to retry.",
        ),
    };
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nConnection: close\r\n\r\n\
         <!DOCTYPE html><html><head><title>getcal</title></head>\
         <body><p>{message}</p></body></html>"
    )
}

/// Response from Google's token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verifier/challenge pair from RFC 7636 appendix B.
    #[test]
    fn challenge_matches_rfc7636_vector() {
        assert_eq!(
            s256_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn each_flow_gets_its_own_secrets() {
        let a = PkceFlow::new();
        let b = PkceFlow::new();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.state, b.state);
        assert_eq!(a.challenge, s256_challenge(&a.verifier));
    }

    #[test]
    fn consent_url_carries_the_pkce_parameters() {
        let flow = PkceFlow::new();
        let url = flow.consent_url(
            "id.apps.googleusercontent.com",
            "http://127.0.0.1:8080/callback",
            &["https://www.googleapis.com/auth/calendar.readonly".to_string()],
        );

        assert!(url.starts_with(AUTH_ENDPOINT));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("code_challenge={}", flow.challenge)));
        assert!(url.contains(&format!("state={}", flow.state)));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("calendar.readonly"));
    }

    #[test]
    fn redirect_with_code_is_granted() {
        let outcome = parse_callback("GET /callback?code=4%2FabcDEF&state=xyz HTTP/1.1").unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Granted {
                code: "4/abcDEF".to_string(),
                state: "xyz".to_string(),
            }
        );
    }

    #[test]
    fn redirect_with_error_is_denied() {
        let outcome =
            parse_callback("GET /callback?error=access_denied&state=xyz HTTP/1.1").unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Denied {
                reason: "access_denied".to_string(),
            }
        );
    }

    #[test]
    fn redirect_without_code_or_error_is_denied() {
        let outcome = parse_callback("GET /callback?state=xyz HTTP/1.1").unwrap();
        assert!(matches!(outcome, CallbackOutcome::Denied { .. }));
    }

    #[test]
    fn unrelated_requests_are_ignored() {
        assert_eq!(parse_callback("GET /favicon.ico HTTP/1.1"), None);
        assert_eq!(parse_callback("POST /callback HTTP/1.1"), None);
        assert_eq!(parse_callback(""), None);
    }

    #[test]
    fn denied_page_reports_failure() {
        let page = response_page(&CallbackOutcome::Denied {
            reason: "access_denied".to_string(),
        });
        assert!(page.starts_with("HTTP/1.1 403"));
        assert!(page.contains("not completed"));
    }
}
