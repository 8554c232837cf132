//! Google Sheets v4 backend, authenticated as a service account.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use canvass_core::Cell;

use crate::canvass::config_reader::{ServiceAccountKey, StoreConfig};
use crate::canvass::store::{TableBackend, TableRange};
use crate::canvass::*;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_LIFETIME_SECS: u64 = 3600;
// Tokens are renewed this long before they expire.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JSValue>>,
}

struct AccessToken {
    token: String,
    expires_at: Instant,
}

pub struct SheetsBackend {
    http: reqwest::Client,
    spreadsheet_id: String,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    token: Mutex<Option<AccessToken>>,
}

impl SheetsBackend {
    /// Builds the backend. Fails when the private key cannot be used for signing.
    pub fn new(config: &StoreConfig) -> CanvassResult<SheetsBackend> {
        let encoding_key =
            EncodingKey::from_rsa_pem(config.key.private_key.as_bytes()).context(InvalidKeySnafu)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("fieldcanvass/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(HttpSnafu { url: SHEETS_API })?;
        info!(
            "Using spreadsheet {} as {}",
            config.spreadsheet_id, config.key.client_email
        );
        Ok(SheetsBackend {
            http,
            spreadsheet_id: config.spreadsheet_id.clone(),
            key: config.key.clone(),
            encoding_key,
            token: Mutex::new(None),
        })
    }

    fn token_uri(&self) -> &str {
        self.key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    async fn access_token(&self) -> CanvassResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(t) = cached.as_ref() {
            if Instant::now() + TOKEN_MARGIN < t.expires_at {
                return Ok(t.token.clone());
            }
        }
        let fresh = self.request_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    // JWT bearer grant: a signed assertion is exchanged for an access token.
    async fn request_token(&self) -> CanvassResult<AccessToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: self.token_uri(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .context(InvalidKeySnafu)?;
        let url = self.token_uri().to_string();
        debug!("request_token: requesting a token from {}", url);
        let req = self.http.post(&url).form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ]);
        let resp = send(req, &url).await?;
        let body: TokenResponse = resp.json().await.context(HttpSnafu { url: url.clone() })?;
        let token = match body.access_token {
            Some(t) if !t.is_empty() => t,
            _ => whatever!("{} did not return an access token", url),
        };
        Ok(AccessToken {
            token,
            expires_at: Instant::now()
                + Duration::from_secs(body.expires_in.unwrap_or(TOKEN_LIFETIME_SECS)),
        })
    }

    fn values_url(&self, range: &TableRange, action: &str) -> String {
        format!(
            "{}/{}/values/{}{}",
            SHEETS_API,
            self.spreadsheet_id,
            urlencoding::encode(&range.to_string()),
            action
        )
    }
}

async fn send(req: reqwest::RequestBuilder, url: &str) -> CanvassResult<reqwest::Response> {
    let resp = req.send().await.context(HttpSnafu { url })?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    RemoteStatusSnafu {
        url,
        status: status.as_u16(),
        body,
    }
    .fail()
}

fn cell_text(v: &JSValue) -> String {
    match v {
        JSValue::String(s) => s.clone(),
        JSValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TableBackend for SheetsBackend {
    async fn append(&self, range: &TableRange, rows: Vec<Vec<Cell>>) -> CanvassResult<()> {
        let url = self.values_url(range, ":append");
        let token = self.access_token().await?;
        let req = self
            .http
            .post(&url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": rows }));
        send(req, &url).await?;
        Ok(())
    }

    async fn update(&self, range: &TableRange, rows: Vec<Vec<Cell>>) -> CanvassResult<()> {
        let url = self.values_url(range, "");
        let token = self.access_token().await?;
        let req = self
            .http
            .put(&url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({
                "range": range.to_string(),
                "majorDimension": "ROWS",
                "values": rows
            }));
        send(req, &url).await?;
        Ok(())
    }

    async fn clear(&self, range: &TableRange) -> CanvassResult<()> {
        let url = self.values_url(range, ":clear");
        let token = self.access_token().await?;
        let req = self.http.post(&url).bearer_auth(token).json(&json!({}));
        send(req, &url).await?;
        Ok(())
    }

    async fn get(&self, range: &TableRange) -> CanvassResult<Vec<Vec<String>>> {
        let url = self.values_url(range, "");
        let token = self.access_token().await?;
        let resp = send(self.http.get(&url).bearer_auth(token), &url).await?;
        let vr: ValueRange = resp.json().await.context(HttpSnafu { url: url.clone() })?;
        debug!("get: {} rows from {}", vr.values.len(), url);
        Ok(vr
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}
