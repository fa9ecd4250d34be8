use crate::config::ClientConfig;
use crate::redact::{redact_secrets, redact_ticket};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Status the guide API answers with when a ticket was already exchanged.
const ALREADY_REDEEMED_STATUS: u16 = 403;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedemptionError {
  #[error("ticket has already been redeemed")]
  AlreadyRedeemed,
  #[error("ticket redemption failed: {message}")]
  Other {
    status: Option<u16>,
    message: String,
  },
}

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("network error")]
  Network(#[from] reqwest::Error),
  #[error("access token was rejected")]
  Unauthorized,
  #[error("object not found")]
  NotFound,
  #[error("guide API error ({0})")]
  Status(u16),
  #[error("invalid response: {0}")]
  InvalidResponse(String),
}

/// Exchanges a one-time ticket for a signed session token.
#[async_trait]
pub trait TicketRedeemer: Send + Sync {
  async fn redeem(&self, ticket: &str) -> Result<String, RedemptionError>;
}

#[derive(Debug, Deserialize)]
struct JSendEnvelope<T> {
  #[serde(default)]
  status: Option<String>,
  data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
  token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCover {
  pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideObject {
  pub title: String,
  #[serde(default)]
  pub covers: Vec<ObjectCover>,
}

/// Media links the webview loads for one guide object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMedia {
  pub cover_url: Option<String>,
  pub audio_url: String,
}

pub(crate) fn map_redemption_status(status_code: u16) -> RedemptionError {
  match status_code {
    ALREADY_REDEEMED_STATUS => RedemptionError::AlreadyRedeemed,
    _ => RedemptionError::Other {
      status: Some(status_code),
      message: format!("guide API error ({status_code})"),
    },
  }
}

fn map_object_status(status_code: u16) -> ApiError {
  match status_code {
    401 | 403 => ApiError::Unauthorized,
    404 => ApiError::NotFound,
    _ => ApiError::Status(status_code),
  }
}

pub(crate) fn parse_token_body(body: &str) -> Result<String, RedemptionError> {
  let invalid = |message: String| RedemptionError::Other {
    status: None,
    message,
  };

  let envelope: JSendEnvelope<TokenData> =
    serde_json::from_str(body).map_err(|e| invalid(format!("invalid token response: {e}")))?;
  if envelope.status.as_deref().is_some_and(|s| s != "success") {
    return Err(invalid("token response was not successful".to_string()));
  }

  envelope
    .data
    .and_then(|d| d.token)
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .ok_or_else(|| invalid("token response carried no token".to_string()))
}

fn build_headers(access_token: Option<&str>) -> HeaderMap {
  let mut headers = HeaderMap::new();
  headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
  if let Some(token) = access_token {
    // The API expects the bare token, without a scheme.
    if let Ok(value) = HeaderValue::from_str(token) {
      headers.insert(AUTHORIZATION, value);
    }
  }
  headers
}

pub struct GuideApiClient {
  http: reqwest::Client,
  base_url: String,
}

impl GuideApiClient {
  pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
    Ok(Self {
      http: reqwest::Client::builder()
        .timeout(config.timeouts.request())
        .connect_timeout(config.timeouts.connect())
        .build()?,
      base_url: config.api_url.clone(),
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub async fn fetch_object(&self, access_token: &str, code: &str) -> Result<GuideObject, ApiError> {
    let url = format!("{}/objects/{}", self.base_url, urlencoding::encode(code));
    let res = self
      .http
      .get(url)
      .headers(build_headers(Some(access_token)))
      .send()
      .await?;

    if !res.status().is_success() {
      return Err(map_object_status(res.status().as_u16()));
    }

    let text = res.text().await?;
    let envelope: JSendEnvelope<GuideObject> = serde_json::from_str(&text)
      .map_err(|e| ApiError::InvalidResponse(redact_secrets(&e.to_string()).to_string()))?;
    envelope
      .data
      .ok_or_else(|| ApiError::InvalidResponse("object response carried no data".to_string()))
  }

  /// Cover images are loaded by the webview directly, so the token travels as
  /// a query parameter instead of a header.
  pub fn object_cover_url(&self, access_token: &str, code: &str, index: i64) -> String {
    format!(
      "{}/objects/{}/covers/{index}?access-token={}",
      self.base_url,
      urlencoding::encode(code),
      urlencoding::encode(access_token)
    )
  }

  pub fn object_audio_url(&self, access_token: &str, code: &str) -> String {
    format!(
      "{}/objects/{}/audio?access-token={}",
      self.base_url,
      urlencoding::encode(code),
      urlencoding::encode(access_token)
    )
  }

  pub fn object_media(&self, access_token: &str, code: &str, cover_index: Option<i64>) -> ObjectMedia {
    ObjectMedia {
      cover_url: cover_index.map(|index| self.object_cover_url(access_token, code, index)),
      audio_url: self.object_audio_url(access_token, code),
    }
  }
}

#[async_trait]
impl TicketRedeemer for GuideApiClient {
  async fn redeem(&self, ticket: &str) -> Result<String, RedemptionError> {
    let url = format!("{}/tickets/{}/token", self.base_url, urlencoding::encode(ticket));
    let res = self
      .http
      .post(url)
      .headers(build_headers(None))
      .json(&json!({}))
      .send()
      .await;

    let res = match res {
      Ok(r) => r,
      Err(e) => {
        let kind = if e.is_timeout() { "timed out" } else { "transport error" };
        let message = redact_ticket(&e.to_string(), ticket).to_string();
        debug!(kind, error = %message, "ticket redemption request failed");
        return Err(RedemptionError::Other {
          status: None,
          message: format!("{kind}: {message}"),
        });
      }
    };

    if !res.status().is_success() {
      return Err(map_redemption_status(res.status().as_u16()));
    }

    let text = res.text().await.map_err(|e| RedemptionError::Other {
      status: None,
      message: redact_ticket(&e.to_string(), ticket).to_string(),
    })?;
    parse_token_body(&text)
  }
}
