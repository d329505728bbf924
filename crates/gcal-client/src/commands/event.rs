//! Event commands on the checked-out calendar.

use chrono::{DateTime, Utc};
use gcal_core::{EventSummary, EventWindow, MAX_EVENT_RESULTS, TimeError, parse_user_datetime};
use gcal_providers::google::{CalendarApi, EventDraft};
use tracing::warn;

use super::Context;
use crate::error::{ClientError, ClientResult};
use crate::render;

/// Arguments of `create-event`.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub summary: String,
    pub from: String,
    pub to: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

/// New values applied by `update-event`.
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub from: String,
    pub to: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

/// Prints events of the current calendar in a window.
pub async fn list(
    ctx: &Context,
    from: Option<&str>,
    to: Option<&str>,
    max_results: Option<u32>,
) -> ClientResult<Vec<EventSummary>> {
    let current = ctx.current_calendar()?;
    let window = EventWindow::resolve(from, to, max_results)?;
    if window.clamped {
        warn!(requested = ?max_results, "event limit clamped");
        eprintln!(
            "WARNING: Querying more than {0} events. Only the first {0} events are displayed!",
            MAX_EVENT_RESULTS
        );
    }

    let api = ctx.calendar_api().await?;
    let events = ctx.checked(api.list_events(&current.id, &window).await).await?;
    println!("{}\n", current.summary);
    print!("{}", render::event_list(&events));
    Ok(events)
}

pub async fn create(ctx: &Context, event: NewEvent) -> ClientResult<()> {
    let current = ctx.current_calendar()?;
    if event.summary.trim().is_empty() {
        return Err(ClientError::Input("--summary is required".to_string()));
    }
    let (start, end) = parse_range(&event.from, &event.to)?;
    let color_id = ctx.config.event_colors.resolve(event.color.as_deref())?;

    let draft = EventDraft {
        summary: Some(event.summary),
        description: Some(
            non_empty(event.description).unwrap_or_else(|| "Description not specified".into()),
        ),
        location: Some(non_empty(event.location).unwrap_or_else(|| "Location not specified".into())),
        start: start.into(),
        end: end.into(),
        color_id: Some(color_id),
    };

    let api = ctx.calendar_api().await?;
    ctx.checked(api.create_event(&current.id, &draft).await).await?;
    println!("Event was created successfully in \"{}\"!", current.summary);
    Ok(())
}

/// Picks one of the first events between `start` and `end`, then
/// replaces its times and any given fields.
pub async fn update(ctx: &Context, start: &str, end: &str, changes: EventChanges) -> ClientResult<()> {
    let current = ctx.current_calendar()?;
    let (from, to) = parse_range(&changes.from, &changes.to)?;
    let color_id = match changes.color.as_deref() {
        Some(name) => Some(ctx.config.event_colors.resolve(Some(name))?),
        None => None,
    };

    let api = ctx.calendar_api().await?;
    let Some(event) = select(ctx, &api, &current.id, start, end, "Select event to update").await?
    else {
        return Ok(());
    };

    let draft = EventDraft {
        summary: non_empty(changes.summary),
        description: non_empty(changes.description),
        location: non_empty(changes.location),
        start: from.into(),
        end: to.into(),
        color_id,
    };
    println!("Updating: {}...", event.summary);
    ctx.checked(api.update_event(&current.id, &event.id, &draft).await)
        .await?;
    println!("Event was updated successfully in \"{}\"!", current.summary);
    Ok(())
}

/// Picks one of the first events between `start` and `end` and deletes it.
pub async fn delete(ctx: &Context, start: &str, end: &str) -> ClientResult<()> {
    let current = ctx.current_calendar()?;
    let api = ctx.calendar_api().await?;
    let Some(event) = select(ctx, &api, &current.id, start, end, "Select event to delete").await?
    else {
        return Ok(());
    };

    println!("Deleting: {}...", event.summary);
    ctx.checked(api.delete_event(&current.id, &event.id).await)
        .await?;
    println!("Event was deleted successfully from \"{}\"!", current.summary);
    Ok(())
}

async fn select(
    ctx: &Context,
    api: &CalendarApi,
    calendar_id: &str,
    start: &str,
    end: &str,
    prompt: &str,
) -> ClientResult<Option<EventSummary>> {
    let window = EventWindow::resolve(Some(start), Some(end), Some(MAX_EVENT_RESULTS))?;
    println!(
        "Fetching first {} events\n{} -- {}...\n",
        MAX_EVENT_RESULTS,
        window.from.with_timezone(&chrono::Local).format("%m/%d/%Y, %H:%M"),
        window.to.with_timezone(&chrono::Local).format("%m/%d/%Y, %H:%M"),
    );

    let mut events = ctx.checked(api.list_events(calendar_id, &window).await).await?;
    if events.is_empty() {
        println!("No events found");
        return Ok(None);
    }
    let labels = events.iter().map(EventSummary::label).collect();
    let index = ctx.pick(prompt, labels)?;
    if index >= events.len() {
        return Err(ClientError::Input("invalid selection".to_string()));
    }
    Ok(Some(events.swap_remove(index)))
}

fn parse_range(from: &str, to: &str) -> ClientResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_user_datetime(from)?;
    let end = parse_user_datetime(to)?;
    if start > end {
        return Err(TimeError::Reversed {
            from: from.to_string(),
            to: to.to_string(),
        }
        .into());
    }
    Ok((start, end))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::commands::testing::{context, context_with_current};

    const FROM: &str = "2025-06-01T10:00:00Z";
    const TO: &str = "2025-06-01T11:00:00Z";

    async fn mount_events(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/calendars/work/events"))
            .and(query_param("maxResults", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [
                {"id": "e1", "summary": "Standup",
                 "start": {"dateTime": "2025-06-01T09:00:00Z"}, "end": {"dateTime": "2025-06-01T09:15:00Z"}},
                {"id": "e2", "summary": "Review",
                 "start": {"dateTime": "2025-06-01T14:00:00Z"}, "end": {"dateTime": "2025-06-01T15:00:00Z"}}
            ]})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn commands_need_a_checked_out_calendar() {
        let server = MockServer::start().await;
        let (ctx, _store, _dir) = context(&server, 0).await;

        let err = list(&ctx, None, None, None).await.unwrap_err();
        assert!(err.to_string().contains("gcal checkout"));
    }

    #[tokio::test]
    async fn list_clamps_limit() {
        let server = MockServer::start().await;
        mount_events(&server).await;
        let (ctx, _store, _dir) = context_with_current(&server, 0, "work").await;

        let events = list(&ctx, Some("2025-06-01T00:00:00Z"), Some("2025-06-02T00:00:00Z"), Some(50))
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn create_fills_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/work/events"))
            .and(body_json(json!({
                "summary": "Lunch",
                "description": "Description not specified",
                "location": "Location not specified",
                "start": {"dateTime": "2025-06-01T10:00:00.000Z"},
                "end": {"dateTime": "2025-06-01T11:00:00.000Z"},
                "colorId": "1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "e9"})))
            .expect(1)
            .mount(&server)
            .await;
        let (ctx, _store, _dir) = context_with_current(&server, 0, "work").await;

        let event = NewEvent {
            summary: "Lunch".into(),
            from: FROM.into(),
            to: TO.into(),
            ..Default::default()
        };
        create(&ctx, event).await.unwrap();
    }

    #[tokio::test]
    async fn create_rejects_unknown_color_before_calling_api() {
        let server = MockServer::start().await;
        let (ctx, _store, _dir) = context_with_current(&server, 0, "work").await;

        let event = NewEvent {
            summary: "Lunch".into(),
            from: FROM.into(),
            to: TO.into(),
            color: Some("mauve".into()),
            ..Default::default()
        };
        assert!(matches!(create(&ctx, event).await, Err(ClientError::Input(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_reversed_range() {
        let server = MockServer::start().await;
        let (ctx, _store, _dir) = context_with_current(&server, 0, "work").await;

        let event = NewEvent {
            summary: "Lunch".into(),
            from: TO.into(),
            to: FROM.into(),
            ..Default::default()
        };
        assert!(matches!(create(&ctx, event).await, Err(ClientError::Input(_))));
    }

    #[tokio::test]
    async fn update_puts_selected_event() {
        let server = MockServer::start().await;
        mount_events(&server).await;
        Mock::given(method("PUT"))
            .and(path("/calendars/work/events/e2"))
            .and(body_json(json!({
                "summary": "Design review",
                "start": {"dateTime": "2025-06-01T10:00:00.000Z"},
                "end": {"dateTime": "2025-06-01T11:00:00.000Z"},
                "colorId": "11"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "e2"})))
            .expect(1)
            .mount(&server)
            .await;
        let (ctx, _store, _dir) = context_with_current(&server, 1, "work").await;

        let changes = EventChanges {
            from: FROM.into(),
            to: TO.into(),
            summary: Some("Design review".into()),
            color: Some("tomato".into()),
            ..Default::default()
        };
        update(&ctx, "2025-06-01T00:00:00Z", "2025-06-02T00:00:00Z", changes)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_removes_selected_event() {
        let server = MockServer::start().await;
        mount_events(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/calendars/work/events/e1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let (ctx, _store, _dir) = context_with_current(&server, 0, "work").await;

        delete(&ctx, "2025-06-01T00:00:00Z", "2025-06-02T00:00:00Z")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_with_no_events_is_a_no_op() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/work/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        let (ctx, _store, _dir) = context_with_current(&server, 0, "work").await;

        delete(&ctx, "2025-06-01T00:00:00Z", "2025-06-02T00:00:00Z")
            .await
            .unwrap();
    }
}
