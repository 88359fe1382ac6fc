//! services/portal/src/adapters/http.rs
//!
//! This module contains the HTTP adapter, the concrete implementation of the
//! `ComplaintService` and `AuthService` ports over the portal's REST API.
//! It maps typed calls onto single requests and response codes onto the
//! `PortError` taxonomy; it never retries and never caches.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use support_portal_core::domain::{
    Complaint, ComplaintId, ComplaintPatch, ComplaintStatus, Credentials, Identity,
    NewComplaint, Priority, Registration, Role, SeverityScore, UserId,
};
use support_portal_core::ports::{
    AuthService, ComplaintService, FieldError, PortError, PortResult, ValidationErrors,
};
use tracing::{debug, error, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A client for the complaint and auth endpoints under one base path.
#[derive(Clone)]
pub struct HttpPortalClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPortalClient {
    /// Creates a new `HttpPortalClient`. `base_url` is the API root, e.g.
    /// `http://127.0.0.1:8000/api`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> PortResult<T> {
        let response = request.send().await.map_err(|e| transport_error(e, what))?;
        read_json(response, what).await
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

/// Account ids arrive as numbers from the service but as strings elsewhere.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_user_id(self) -> UserId {
        match self {
            WireId::Number(n) => UserId::new(n.to_string()),
            WireId::Text(s) => UserId::new(s),
        }
    }
}

/// Service timestamps are either RFC 3339 or a zone-less
/// `YYYY-MM-DD HH:MM:SS[.ffffff]` string, which is read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
    }
}

#[derive(Deserialize)]
struct ComplaintRecord {
    id: i64,
    #[serde(default, alias = "user_id")]
    user: Option<WireId>,
    #[serde(default)]
    user_name: Option<String>,
    title: String,
    description: String,
    #[serde(default)]
    category: Option<String>,
    status: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    ai_severity_score: Option<i64>,
    #[serde(default)]
    ai_predicted_resolution_time: Option<String>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

impl ComplaintRecord {
    fn to_domain(self) -> PortResult<Complaint> {
        let status = self.status.parse::<ComplaintStatus>().map_err(|e| {
            PortError::Unexpected(format!("Complaint {}: {}", self.id, e))
        })?;
        let ai_severity_score = self.ai_severity_score.and_then(|raw| {
            let score = SeverityScore::new(raw);
            if score.is_none() {
                warn!("Ignoring out-of-range severity {} on complaint {}", raw, self.id);
            }
            score
        });

        Ok(Complaint {
            id: ComplaintId(self.id),
            owner_id: self.user.map(WireId::into_user_id),
            owner_name: self.user_name,
            title: self.title,
            description: self.description,
            category: self.category.unwrap_or_default(),
            status,
            priority: self.priority.as_deref().and_then(Priority::from_wire),
            ai_severity_score,
            ai_predicted_resolution_time: self.ai_predicted_resolution_time,
            resolution: self.resolution,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Deserialize)]
struct IdentityRecord {
    id: WireId,
    email: String,
    full_name: String,
    role: String,
}

impl IdentityRecord {
    fn to_domain(self) -> Identity {
        Identity {
            id: self.id.into_user_id(),
            display_name: self.full_name,
            email: self.email,
            role: Role::from_wire(&self.role),
        }
    }
}

#[derive(Deserialize)]
struct SuggestionRecord {
    #[serde(default)]
    suggestion: Option<String>,
}

/// Numeric account ids go back out as numbers.
#[derive(Serialize)]
#[serde(untagged)]
enum OutgoingId<'a> {
    Number(i64),
    Text(&'a str),
}

impl<'a> From<&'a UserId> for OutgoingId<'a> {
    fn from(id: &'a UserId) -> Self {
        match id.as_str().parse::<i64>() {
            Ok(n) => OutgoingId::Number(n),
            Err(_) => OutgoingId::Text(id.as_str()),
        }
    }
}

#[derive(Serialize)]
struct CreateComplaintBody<'a> {
    title: &'a str,
    category: &'a str,
    description: &'a str,
    user_id: OutgoingId<'a>,
}

#[derive(Serialize)]
struct PatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<&'a str>,
}

impl<'a> From<&'a ComplaintPatch> for PatchBody<'a> {
    fn from(patch: &'a ComplaintPatch) -> Self {
        Self {
            status: patch.status.map(|s| s.as_str()),
            resolution: patch.resolution.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    full_name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

//=========================================================================================
// Response Mapping
//=========================================================================================

fn transport_error(e: reqwest::Error, what: &str) -> PortError {
    error!("Request for {} failed: {}", what, e);
    PortError::Transport(e.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> PortResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_for_status(status, &body, what));
    }
    response.json::<T>().await.map_err(|e| {
        error!("Malformed response for {}: {}", what, e);
        PortError::Unexpected(format!("Malformed response for {}: {}", what, e))
    })
}

fn error_for_status(status: StatusCode, body: &str, what: &str) -> PortError {
    debug!("{} answered {}", what, status);
    match status {
        StatusCode::NOT_FOUND => PortError::NotFound(format!("{} not found", what)),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            PortError::Validation(parse_validation(body))
        }
        StatusCode::UNAUTHORIZED => PortError::AuthenticationFailed,
        s if s.is_server_error() => PortError::Transport(format!("{} returned {}", what, s)),
        s => PortError::Unexpected(format!("{} returned {}", what, s)),
    }
}

/// Reads either `{"detail": "..."}` or `{"field": ["message", ...], ...}`,
/// keeping the first message per field in the order the service sent them.
fn parse_validation(body: &str) -> ValidationErrors {
    let value = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value,
        Err(_) if body.trim().is_empty() => return ValidationErrors::default(),
        Err(_) => return ValidationErrors::detail(body.trim()),
    };

    match value {
        serde_json::Value::String(detail) => ValidationErrors::detail(detail),
        serde_json::Value::Object(map) => {
            match map.get("detail") {
                Some(serde_json::Value::String(detail)) => {
                    return ValidationErrors::detail(detail.as_str());
                }
                Some(serde_json::Value::Array(items)) => {
                    return ValidationErrors {
                        detail: None,
                        fields: items.iter().filter_map(located_error).collect(),
                    };
                }
                _ => {}
            }
            let fields = map
                .into_iter()
                .filter_map(|(field, messages)| {
                    let message = match messages {
                        serde_json::Value::String(s) => Some(s),
                        serde_json::Value::Array(items) => items
                            .into_iter()
                            .find_map(|m| m.as_str().map(str::to_string)),
                        _ => None,
                    }?;
                    Some(FieldError::new(field, message))
                })
                .collect();
            ValidationErrors { detail: None, fields }
        }
        _ => ValidationErrors::default(),
    }
}

/// One `{"loc": [...], "msg": "..."}` entry of a `detail` list. The field is
/// the last segment of `loc`.
fn located_error(item: &serde_json::Value) -> Option<FieldError> {
    let message = item.get("msg")?.as_str()?;
    let field = match item.get("loc")?.as_array()?.last()? {
        serde_json::Value::String(name) => name.clone(),
        other => other.to_string(),
    };
    Some(FieldError::new(field, message))
}

//=========================================================================================
// `ComplaintService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ComplaintService for HttpPortalClient {
    async fn list_complaints(&self, owner: Option<&UserId>) -> PortResult<Vec<Complaint>> {
        let mut request = self.http.get(self.url("/complaints/"));
        if let Some(owner) = owner {
            request = request.query(&[("user_id", owner.as_str())]);
        }
        debug!("Listing complaints (owner: {:?})", owner.map(UserId::as_str));
        let records: Vec<ComplaintRecord> = self.send(request, "Complaint list").await?;
        records.into_iter().map(ComplaintRecord::to_domain).collect()
    }

    async fn get_complaint(&self, id: ComplaintId) -> PortResult<Complaint> {
        let request = self.http.get(self.url(&format!("/complaints/{}/", id)));
        let record: ComplaintRecord = self.send(request, &format!("Complaint {}", id)).await?;
        record.to_domain()
    }

    async fn create_complaint(&self, complaint: &NewComplaint) -> PortResult<Complaint> {
        let body = CreateComplaintBody {
            title: &complaint.title,
            category: &complaint.category,
            description: &complaint.description,
            user_id: OutgoingId::from(&complaint.owner_id),
        };
        let request = self.http.post(self.url("/complaints/")).json(&body);
        let record: ComplaintRecord = self.send(request, "New complaint").await?;
        record.to_domain()
    }

    async fn update_complaint(
        &self,
        id: ComplaintId,
        patch: &ComplaintPatch,
    ) -> PortResult<Complaint> {
        let request = self
            .http
            .patch(self.url(&format!("/complaints/{}/", id)))
            .json(&PatchBody::from(patch));
        let record: ComplaintRecord = self.send(request, &format!("Complaint {}", id)).await?;
        record.to_domain()
    }

    async fn fetch_suggested_resolution(&self, id: ComplaintId) -> PortResult<String> {
        let what = format!("Complaint {}", id);
        let response = self
            .http
            .get(self.url(&format!("/complaints/{}/suggest_resolution/", id)))
            .send()
            .await
            .map_err(|e| transport_error(e, &what))?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(PortError::SuggestionUnavailable(id));
        }

        let record: SuggestionRecord = read_json(response, &what).await?;
        match record.suggestion {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(PortError::SuggestionUnavailable(id)),
        }
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpPortalClient {
    async fn register_account(&self, registration: &Registration) -> PortResult<Identity> {
        let body = RegisterBody {
            full_name: &registration.full_name,
            email: &registration.email,
            password: &registration.password,
        };
        let request = self.http.post(self.url("/auth/register")).json(&body);
        let record: IdentityRecord = self.send(request, "Registration").await?;
        Ok(record.to_domain())
    }

    async fn authenticate(&self, credentials: &Credentials) -> PortResult<Identity> {
        let body = LoginBody {
            email: &credentials.email,
            password: &credentials.password,
        };
        let request = self.http.post(self.url("/auth/login")).json(&body);
        // A rejected login form is still a failed sign-in to the caller.
        let record: IdentityRecord = match self.send(request, "Login").await {
            Err(PortError::Validation(errors)) => {
                debug!("Login rejected as invalid: {}", errors);
                return Err(PortError::AuthenticationFailed);
            }
            other => other?,
        };
        Ok(record.to_domain())
    }
}
