//! Google Calendar v3 API client.
//!
//! Thin typed layer over [`ProviderClient`]: builds paths, installs the
//! bearer token on every verb, and converts Google's resources into
//! [`CalendarSummary`] and [`EventSummary`].

use chrono::{DateTime, NaiveDate, Utc};
use gcal_core::{CalendarSummary, EventSummary, EventTime, EventWindow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderResult;
use crate::http::{HttpClientConfig, HttpVerb, ProviderClient, ProviderResponse};

const SETTINGS: &str = "users/me/settings";
const CALENDAR_LIST: &str = "users/me/calendarList";
const CALENDARS: &str = "calendars";

/// Authenticated client for calendar and event resources.
#[derive(Debug, Clone)]
pub struct CalendarApi {
    client: ProviderClient,
}

impl CalendarApi {
    /// Creates a client that sends `access_token` with every verb.
    pub fn new(config: HttpClientConfig, access_token: &str) -> ProviderResult<Self> {
        let mut client = ProviderClient::new(config.with_provider("google"))?;
        for verb in HttpVerb::ALL {
            client.set_authorization_header(verb, access_token)?;
        }
        Ok(Self { client })
    }

    /// Fetches the user's settings. Used as a liveness check for a token.
    pub async fn settings(&self) -> ProviderResult<ProviderResponse> {
        self.client.get(SETTINGS).await
    }

    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarSummary>> {
        let list: CalendarListResponse = self.client.get(CALENDAR_LIST).await?.json()?;
        debug!(count = list.items.len(), "fetched calendar list");
        Ok(list.items.into_iter().map(CalendarSummary::from).collect())
    }

    pub async fn get_calendar(&self, calendar_id: &str) -> ProviderResult<CalendarSummary> {
        let path = format!("{}/{}", CALENDAR_LIST, encode(calendar_id));
        let entry: CalendarListEntry = self.client.get(&path).await?.json()?;
        Ok(entry.into())
    }

    pub async fn create_calendar(&self, calendar: &CalendarResource) -> ProviderResult<CalendarResource> {
        self.client.post(CALENDARS, calendar).await?.json()
    }

    pub async fn update_calendar(
        &self,
        calendar_id: &str,
        calendar: &CalendarResource,
    ) -> ProviderResult<CalendarResource> {
        let path = format!("{}/{}", CALENDARS, encode(calendar_id));
        self.client.put(&path, calendar).await?.json()
    }

    pub async fn delete_calendar(&self, calendar_id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}", CALENDARS, encode(calendar_id));
        self.client.delete(&path).await?;
        Ok(())
    }

    /// Lists single event instances in `window`, ordered by start time.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        window: &EventWindow,
    ) -> ProviderResult<Vec<EventSummary>> {
        let path = events_path(calendar_id);
        let query = [
            ("maxResults", window.max_results.to_string()),
            ("timeMin", window.time_min()),
            ("timeMax", window.time_max()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        let list: EventListResponse = self.client.get_with_query(&path, &query).await?.json()?;
        let events: Vec<EventSummary> = list
            .items
            .into_iter()
            .filter_map(ApiEvent::into_summary)
            .collect();
        debug!(count = events.len(), calendar = %calendar_id, "fetched events");
        Ok(events)
    }

    pub async fn create_event(&self, calendar_id: &str, event: &EventDraft) -> ProviderResult<()> {
        self.client.post(&events_path(calendar_id), event).await?;
        Ok(())
    }

    pub async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &EventDraft,
    ) -> ProviderResult<()> {
        let path = format!("{}/{}", events_path(calendar_id), encode(event_id));
        self.client.put(&path, event).await?;
        Ok(())
    }

    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}", events_path(calendar_id), encode(event_id));
        self.client.delete(&path).await?;
        Ok(())
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn events_path(calendar_id: &str) -> String {
    format!("{}/{}/events", CALENDARS, encode(calendar_id))
}

/// Calendar resource as sent to and returned by `calendars`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Start or end instant of an event being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
}

impl From<DateTime<Utc>> for EventDateTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            date_time: dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// Body of an event insert or update.
///
/// Absent text fields are left out of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListEntry {
    id: String,
    #[serde(default)]
    summary: String,
    time_zone: Option<String>,
    #[serde(default)]
    primary: bool,
    access_role: Option<String>,
}

impl From<CalendarListEntry> for CalendarSummary {
    fn from(entry: CalendarListEntry) -> Self {
        Self {
            id: entry.id,
            summary: entry.summary,
            timezone: entry.time_zone,
            primary: entry.primary,
            role: entry.access_role,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    color_id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl ApiEventTime {
    fn parse(&self) -> Option<EventTime> {
        if let Some(ref dt) = self.date_time {
            return DateTime::parse_from_rfc3339(dt)
                .map(|d| EventTime::DateTime(d.with_timezone(&Utc)))
                .map_err(|e| warn!("failed to parse event time '{}': {}", dt, e))
                .ok();
        }
        let date = self.date.as_deref()?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(EventTime::AllDay)
            .map_err(|e| warn!("failed to parse event date '{}': {}", date, e))
            .ok()
    }
}

impl ApiEvent {
    fn into_summary(self) -> Option<EventSummary> {
        if self.status.as_deref() == Some("cancelled") {
            return None;
        }
        let id = self.id?;
        let start = self.start.as_ref().and_then(ApiEventTime::parse);
        let end = self.end.as_ref().and_then(ApiEventTime::parse);
        let (Some(start), Some(end)) = (start, end) else {
            warn!(event = %id, "skipping event without usable start/end");
            return None;
        };

        Some(EventSummary {
            id,
            summary: self.summary.unwrap_or_default(),
            description: self.description,
            location: self.location,
            start,
            end,
            color_id: self.color_id,
        })
    }
}
