//! HTTP client for the hosted platform.
//!
//! Auth against `/auth/v1/*`, row operations against `/rest/v1/bookmarks`,
//! and a newline-delimited JSON change feed streamed from
//! `/realtime/v1/stream`. One blocking request per operation; the change
//! feed is read by a dedicated thread that forwards typed events onto the
//! subscription channel.

use std::io::{BufRead, BufReader};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::api::BackendApi;
use crate::backend::realtime::{CancelToken, ChangeEvent, Subscription};
use crate::config::BackendConfig;
use crate::types::bookmark::{Bookmark, BookmarkDraft};
use crate::types::errors::{AuthError, BackendError};
use crate::types::session::{OAuthProvider, Session};
use crate::types::user::User;

const BOOKMARKS_TABLE: &str = "bookmarks";

/// JWT payload claims this client reads from the access token.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// One line of the streamed change feed.
#[derive(Debug, Deserialize)]
struct FeedLine {
    #[serde(rename = "type")]
    kind: String,
    record: Option<Bookmark>,
    old_record: Option<DeletedRecord>,
}

#[derive(Debug, Deserialize)]
struct DeletedRecord {
    id: String,
}

#[derive(Debug, serde::Serialize)]
struct InsertBody<'a> {
    title: &'a str,
    url: &'a str,
    owner_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: User,
}

/// Production client for the hosted platform.
pub struct HttpBackend {
    http: Client,
    base_url: String,
    anon_key: String,
    session: Mutex<Option<Session>>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            session: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| BackendError::Transport(e.to_string()))
    }

    fn endpoint_with<I, K, V>(&self, path: &str, query: I) -> Result<Url, BackendError>
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Url::parse_with_params(&format!("{}{}", self.base_url, path), query)
            .map_err(|e| BackendError::Transport(e.to_string()))
    }

    /// Bearer value for outgoing requests: the session token when signed
    /// in, the anonymous key otherwise.
    fn bearer(&self) -> String {
        self.session
            .lock()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.access_token.clone()))
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn authed(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    fn rejected(resp: Response) -> BackendError {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        BackendError::Rejected(format!("{}: {}", status, body))
    }

    fn now_secs() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Decodes the claims segment of a JWT access token.
    fn decode_claims(token: &str) -> Option<Claims> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

impl BackendApi for HttpBackend {
    fn sign_in_url(&self, provider: OAuthProvider, redirect_to: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &format!("{}/auth/v1/authorize", self.base_url),
            &[("provider", provider.as_str()), ("redirect_to", redirect_to)],
        )
        .map_err(|e| AuthError::SignInFailed(e.to_string()))?;
        Ok(url.into())
    }

    fn exchange_code(&self, code: &str) -> Result<Session, AuthError> {
        let url = self
            .endpoint_with("/auth/v1/token", [("grant_type", "authorization_code")])
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(AuthError::ExchangeFailed(format!("{}: {}", status, body)));
        }
        let token: TokenResponse = resp
            .json()
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;
        let session = Session {
            access_token: token.access_token,
            user: token.user,
        };
        if let Ok(mut slot) = self.session.lock() {
            *slot = Some(session.clone());
        }
        Ok(session)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        // The local session is gone either way; a failed logout call only
        // means the platform-side token lives until expiry.
        let bearer = self.bearer();
        if let Ok(mut slot) = self.session.lock() {
            *slot = None;
        }
        let url = self
            .endpoint("/auth/v1/logout")
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .send()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AuthError::SignOutFailed(resp.status().to_string()));
        }
        Ok(())
    }

    fn current_user(&self) -> Result<Option<User>, AuthError> {
        let session = self
            .session
            .lock()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let Some(session) = session.as_ref() else {
            return Ok(None);
        };
        match Self::decode_claims(&session.access_token) {
            Some(claims) if claims.sub != session.user.id => {
                warn!("token subject does not match session user, treating as signed out");
                Ok(None)
            }
            Some(claims) if claims.exp > Self::now_secs() => Ok(Some(session.user.clone())),
            Some(_) => {
                debug!("access token expired, treating as signed out");
                Ok(None)
            }
            None => {
                warn!("access token claims undecodable, treating as signed out");
                Ok(None)
            }
        }
    }

    fn insert_bookmark(&self, draft: &BookmarkDraft, owner: &User) -> Result<Bookmark, BackendError> {
        let url = self.endpoint(&format!("/rest/v1/{}", BOOKMARKS_TABLE))?;
        let body = InsertBody {
            title: draft.title(),
            url: draft.url(),
            owner_id: &owner.id,
        };
        let resp = self
            .authed(self.http.post(url))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::rejected(resp));
        }
        let mut rows: Vec<Bookmark> = resp.json().map_err(|e| BackendError::Decode(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| BackendError::Decode("insert returned no representation".to_string()))
    }

    fn delete_bookmark(&self, id: &str) -> Result<(), BackendError> {
        let url = self.endpoint_with(
            &format!("/rest/v1/{}", BOOKMARKS_TABLE),
            [("id", format!("eq.{}", id))],
        )?;
        let resp = self
            .authed(self.http.delete(url))
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::rejected(resp));
        }
        Ok(())
    }

    fn list_bookmarks(&self, owner_id: &str) -> Result<Vec<Bookmark>, BackendError> {
        let url = self.endpoint_with(
            &format!("/rest/v1/{}", BOOKMARKS_TABLE),
            [
                ("owner_id", format!("eq.{}", owner_id)),
                ("order", "created_at.desc,seq.desc".to_string()),
            ],
        )?;
        let resp = self
            .authed(self.http.get(url))
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::rejected(resp));
        }
        resp.json().map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn subscribe(&self, owner_id: &str) -> Result<Subscription, BackendError> {
        let url = self.endpoint_with(
            "/realtime/v1/stream",
            [
                ("table", BOOKMARKS_TABLE.to_string()),
                ("owner_id", format!("eq.{}", owner_id)),
            ],
        )?;
        let resp = self
            .authed(self.http.get(url))
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::rejected(resp));
        }

        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let reader_cancel = cancel.clone();
        thread::spawn(move || {
            let reader = BufReader::new(resp);
            for line in reader.lines() {
                if reader_cancel.is_cancelled() {
                    break;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "change feed stream ended");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let feed: FeedLine = match serde_json::from_str(&line) {
                    Ok(feed) => feed,
                    Err(e) => {
                        warn!(error = %e, "skipping undecodable change feed line");
                        continue;
                    }
                };
                let event = match (feed.kind.as_str(), feed.record, feed.old_record) {
                    ("INSERT", Some(record), _) => ChangeEvent::Inserted(record),
                    ("DELETE", _, Some(old)) => ChangeEvent::Deleted(old.id),
                    (kind, _, _) => {
                        debug!(kind, "ignoring change feed event");
                        continue;
                    }
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
        Ok(Subscription::new(rx, cancel))
    }
}
