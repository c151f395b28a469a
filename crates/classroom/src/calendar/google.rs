//! Google Calendar client
//!
//! Talks to the Calendar v3 REST API with an OAuth refresh token. Access
//! tokens are cached until shortly before they expire.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use super::CalendarClient;
use crate::error::{ClassroomError, Result};
use crate::model::CalendarEvent;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// Credentials and target calendar
#[derive(Clone, Debug)]
pub struct GoogleCalendarConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_uri: String,
    pub calendar_id: String,

    /// IANA zone name sent alongside event times
    pub time_zone: String,
}

impl GoogleCalendarConfig {
    /// Read `GOOGLE_CALENDAR_*` and `CALENDAR_ID`.
    ///
    /// Returns `None` when any credential is missing.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Some(Self {
            client_id: get("GOOGLE_CALENDAR_CLIENT_ID")?,
            client_secret: get("GOOGLE_CALENDAR_CLIENT_SECRET")?,
            refresh_token: get("GOOGLE_CALENDAR_REFRESH_TOKEN")?,
            token_uri: get("GOOGLE_CALENDAR_TOKEN_URI").unwrap_or_else(|| DEFAULT_TOKEN_URI.into()),
            calendar_id: get("CALENDAR_ID").unwrap_or_else(|| "primary".into()),
            time_zone: get("CALENDAR_TIME_ZONE").unwrap_or_else(|| "Asia/Kolkata".into()),
        })
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// `CalendarClient` backed by Google Calendar
pub struct GoogleCalendarClient {
    http: Client,
    config: GoogleCalendarConfig,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expiry")]
    expires_in: u64,
}

const fn default_expiry() -> u64 {
    3600
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

#[derive(Deserialize)]
struct ApiEvent {
    id: String,
    #[serde(default)]
    summary: String,
    start: ApiTime,
    end: ApiTime,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTime {
    date_time: Option<DateTime<FixedOffset>>,
}

impl ApiEvent {
    /// All-day entries carry only a date and are skipped
    fn into_event(self) -> Option<CalendarEvent> {
        Some(CalendarEvent {
            id: self.id,
            summary: self.summary,
            start: self.start.date_time?,
            end: self.end.date_time?,
        })
    }
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleCalendarConfig) -> Self {
        Self {
            http: Client::new(),
            config,
            token: Mutex::new(None),
        }
    }

    /// Create from environment variables, if credentials are present
    pub fn from_env() -> Option<Self> {
        GoogleCalendarConfig::from_env().map(Self::new)
    }

    pub fn config(&self) -> &GoogleCalendarConfig {
        &self.config
    }

    fn events_url(&self) -> String {
        format!("{CALENDAR_API_BASE}/calendars/{}/events", self.config.calendar_id)
    }

    fn event_url(&self, id: &str) -> String {
        format!("{}/{id}", self.events_url())
    }

    fn time_body(&self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> serde_json::Value {
        json!({
            "start": { "dateTime": start.to_rfc3339(), "timeZone": self.config.time_zone },
            "end": { "dateTime": end.to_rfc3339(), "timeZone": self.config.time_zone },
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!(token_uri = %self.config.token_uri, "Refreshing calendar access token");

        let response = self
            .http
            .post(&self.config.token_uri)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassroomError::Auth(format!("token refresh failed ({status}): {body}")));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassroomError::Calendar(format!("Calendar API error ({status}): {body}")));
        }

        Ok(response)
    }

    async fn list(&self, query: &[(&str, String)]) -> Result<Vec<CalendarEvent>> {
        let response = self.send(self.http.get(self.events_url()).query(query)).await?;
        let list: EventList = response.json().await?;
        Ok(list.items.into_iter().filter_map(ApiEvent::into_event).collect())
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn events_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<CalendarEvent>> {
        self.list(&[
            ("timeMin", from.to_rfc3339()),
            ("timeMax", to.to_rfc3339()),
            ("singleEvents", "true".into()),
            ("orderBy", "startTime".into()),
        ])
        .await
    }

    async fn insert(
        &self,
        summary: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<CalendarEvent> {
        let mut body = self.time_body(start, end);
        body["summary"] = json!(summary);

        let response = self.send(self.http.post(self.events_url()).json(&body)).await?;
        let created: ApiEvent = response.json().await?;
        created
            .into_event()
            .ok_or_else(|| ClassroomError::Calendar("created event has no start/end time".into()))
    }

    async fn find_by_summary(&self, summary: &str) -> Result<Option<CalendarEvent>> {
        let wanted = summary.trim().to_lowercase();
        let found = self.list(&[("q", summary.trim().to_string())]).await?;
        Ok(found.into_iter().find(|e| e.summary.to_lowercase() == wanted))
    }

    async fn patch_times(
        &self,
        id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<CalendarEvent> {
        let body = self.time_body(start, end);
        let response = self.send(self.http.patch(self.event_url(id)).json(&body)).await?;
        let updated: ApiEvent = response.json().await?;
        updated
            .into_event()
            .ok_or_else(|| ClassroomError::Calendar("updated event has no start/end time".into()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.send(self.http.delete(self.event_url(id))).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_requires_credentials() {
        assert!(GoogleCalendarConfig::from_lookup(lookup(&[])).is_none());
        assert!(GoogleCalendarConfig::from_lookup(lookup(&[
            ("GOOGLE_CALENDAR_CLIENT_ID", "id"),
            ("GOOGLE_CALENDAR_CLIENT_SECRET", ""),
            ("GOOGLE_CALENDAR_REFRESH_TOKEN", "refresh"),
        ]))
        .is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config = GoogleCalendarConfig::from_lookup(lookup(&[
            ("GOOGLE_CALENDAR_CLIENT_ID", "id"),
            ("GOOGLE_CALENDAR_CLIENT_SECRET", "secret"),
            ("GOOGLE_CALENDAR_REFRESH_TOKEN", "refresh"),
        ]))
        .unwrap();

        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(config.time_zone, "Asia/Kolkata");
    }

    #[test]
    fn test_event_list_skips_all_day_entries() {
        let body = r#"{
            "items": [
                {
                    "id": "a1",
                    "summary": "Maths",
                    "start": {"dateTime": "2025-07-14T09:00:00+05:30"},
                    "end": {"dateTime": "2025-07-14T10:00:00+05:30"}
                },
                {
                    "id": "a2",
                    "summary": "Sports Day",
                    "start": {"date": "2025-07-14"},
                    "end": {"date": "2025-07-15"}
                }
            ]
        }"#;

        let list: EventList = serde_json::from_str(body).unwrap();
        let events: Vec<_> = list.items.into_iter().filter_map(ApiEvent::into_event).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Maths");
    }
}
