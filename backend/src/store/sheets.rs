// src/store/sheets.rs

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use url::Url;

use crate::{
    config::SheetsConfig,
    error::StoreError,
    models::result_record::{ROW_HEADERS, ResultRecord},
    store::ResultsStore,
};

const SHEETS_SCOPE: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields of a Google service-account key file this store needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Auth(format!("cannot read service account key: {}", e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| StoreError::Auth(format!("invalid service account key: {}", e)))
    }
}

/// JWT assertion claims for the OAuth2 JWT-bearer grant.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// `values.get` response body.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Results store backed by one worksheet of a Google spreadsheet.
///
/// The first row of the range is the header row; every later row is one
/// result in the 11-column layout.
pub struct SheetsResultsStore {
    client: Client,
    key: ServiceAccountKey,
    api_base: Url,
    spreadsheet_id: String,
    range: String,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsResultsStore {
    pub fn new(config: &SheetsConfig) -> Result<Self, StoreError> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        Ok(Self::with_key(config, key))
    }

    pub fn with_key(config: &SheetsConfig, key: ServiceAccountKey) -> Self {
        Self {
            client: Client::new(),
            key,
            api_base: config.api_base.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            range: config.range.clone(),
            token: Mutex::new(None),
        }
    }

    fn values_url(&self, suffix: &str) -> Result<Url, StoreError> {
        let path = format!(
            "spreadsheets/{}/values/{}{}",
            self.spreadsheet_id, self.range, suffix
        );
        Ok(self.api_base.join(&path)?)
    }

    /// Returns a bearer token, exchanging a fresh signed assertion when the
    /// cached one is missing or within a minute of expiry.
    async fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at > now + Duration::seconds(60) {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.sign_assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let token: TokenResponse = ensure_success(response).await?.json().await?;

        tracing::debug!(expires_in = token.expires_in, "Obtained sheets access token");

        let fresh = CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        };
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(e.to_string()))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StoreError::Auth(e.to_string()))
    }
}

#[async_trait]
impl ResultsStore for SheetsResultsStore {
    async fn append(&self, record: &ResultRecord) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let url = self.values_url(":append")?;

        let response = self
            .client
            .post(url)
            .query(&[
                // RAW keeps every cell as sent: no formula evaluation, no
                // date or number coercion of the name and timestamp text.
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token)
            .json(&json!({ "values": [record.to_row()] }))
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ResultRecord>, StoreError> {
        let token = self.access_token().await?;
        let url = self.values_url("")?;

        let response = self
            .client
            .get(url)
            .query(&[("valueRenderOption", "UNFORMATTED_VALUE")])
            .bearer_auth(token)
            .send()
            .await?;
        let range: ValueRange = ensure_success(response).await?.json().await?;

        Ok(records_from_values(range.values))
    }
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Remote {
        status: status.as_u16(),
        body,
    })
}

/// Drops the header row and any row that does not fit the 11-column layout.
fn records_from_values(values: Vec<Vec<Value>>) -> Vec<ResultRecord> {
    values
        .into_iter()
        .filter(|row| !is_header(row))
        .filter_map(|row| match ResultRecord::from_row(&row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping sheet row: {}", e);
                None
            }
        })
        .collect()
}

fn is_header(row: &[Value]) -> bool {
    row.first().and_then(Value::as_str) == Some(ROW_HEADERS[0])
        && row.get(1).and_then(Value::as_str) == Some(ROW_HEADERS[1])
}
