//! Calendar commands: checkout, list, create, update, delete.

use gcal_core::CalendarSummary;
use gcal_providers::google::{CalendarApi, CalendarResource};
use tracing::info;

use super::Context;
use crate::current::CurrentCalendar;
use crate::error::{ClientError, ClientResult};
use crate::render;

/// Optional fields of a calendar create or update.
#[derive(Debug, Clone, Default)]
pub struct CalendarFields {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub timezone: Option<String>,
    pub location: Option<String>,
}

/// Selects a calendar and saves it as the current one.
pub async fn checkout(ctx: &mut Context, id: Option<String>) -> ClientResult<CurrentCalendar> {
    let api = ctx.calendar_api().await?;
    let calendar = match id {
        Some(id) => ctx.checked(api.get_calendar(&id).await).await?,
        None => select(ctx, &api, "Select calendar").await?,
    };

    let current = CurrentCalendar::from(&calendar);
    current.save(&ctx.current_path)?;
    ctx.set_current(Some(current.clone()));
    info!(id = %current.id, "checked out calendar");
    println!("Checked out as \"{}\"", current.summary);
    Ok(current)
}

/// Prints all calendars as a list or a table.
pub async fn list(ctx: &Context, table: bool) -> ClientResult<()> {
    let api = ctx.calendar_api().await?;
    let calendars = ctx.checked(api.list_calendars().await).await?;
    if table {
        print!("{}", render::calendar_table(&calendars));
    } else {
        print!("{}", render::calendar_list(&calendars));
    }
    Ok(())
}

pub async fn create(ctx: &Context, fields: CalendarFields) -> ClientResult<CalendarResource> {
    let summary = fields
        .summary
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ClientError::Input("--summary is required".to_string()))?;
    let resource = CalendarResource {
        id: None,
        summary,
        description: fields.description,
        time_zone: fields.timezone,
        location: fields.location,
    };

    let api = ctx.calendar_api().await?;
    let created = ctx.checked(api.create_calendar(&resource).await).await?;
    println!("Calendar \"{}\" was created successfully!", created.summary);
    Ok(created)
}

/// Updates a calendar, keeping its summary when none is given.
pub async fn update(
    ctx: &Context,
    id: Option<String>,
    fields: CalendarFields,
) -> ClientResult<CalendarResource> {
    let api = ctx.calendar_api().await?;
    let existing = match id {
        Some(id) => ctx.checked(api.get_calendar(&id).await).await?,
        None => select(ctx, &api, "Select calendar to update").await?,
    };

    let resource = CalendarResource {
        id: Some(existing.id.clone()),
        summary: fields
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(existing.summary),
        description: fields.description,
        time_zone: fields.timezone,
        location: fields.location,
    };
    println!("Updating {}...", resource.summary);

    let updated = ctx
        .checked(api.update_calendar(&existing.id, &resource).await)
        .await?;
    println!("Calendar \"{}\" was updated successfully!", updated.summary);
    Ok(updated)
}

/// Deletes a calendar. Clears the current-calendar pointer if it pointed
/// at the deleted one.
pub async fn delete(ctx: &mut Context, id: Option<String>) -> ClientResult<()> {
    let api = ctx.calendar_api().await?;
    let target = match id {
        Some(id) => ctx.checked(api.get_calendar(&id).await).await?,
        None => select(ctx, &api, "Select calendar to delete").await?,
    };

    println!("Deleting {}...", target.summary);
    ctx.checked(api.delete_calendar(&target.id).await).await?;

    if ctx.current_calendar().is_ok_and(|c| c.id == target.id) {
        if let Err(e) = std::fs::remove_file(&ctx.current_path) {
            tracing::warn!(error = %e, "failed to remove current calendar pointer");
        }
        ctx.set_current(None);
    }
    println!("Calendar deleted successfully!");
    Ok(())
}

async fn select(ctx: &Context, api: &CalendarApi, prompt: &str) -> ClientResult<CalendarSummary> {
    let mut calendars = ctx.checked(api.list_calendars().await).await?;
    if calendars.is_empty() {
        return Err(ClientError::Input("no calendars found".to_string()));
    }
    let labels = calendars.iter().map(CalendarSummary::label).collect();
    let index = ctx.pick(prompt, labels)?;
    if index >= calendars.len() {
        return Err(ClientError::Input("invalid selection".to_string()));
    }
    Ok(calendars.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::commands::testing::{context, context_with_current};
    use crate::store::{StoreKey, TokenStore};

    async fn mount_calendar_list(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [
                {"id": "me@example.com", "summary": "Me", "primary": true, "accessRole": "owner"},
                {"id": "team", "summary": "Team", "timeZone": "UTC", "accessRole": "writer"}
            ]})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn checkout_by_selection_saves_pointer() {
        let server = MockServer::start().await;
        mount_calendar_list(&server).await;
        let (mut ctx, _store, _dir) = context(&server, 1).await;

        let current = checkout(&mut ctx, None).await.unwrap();
        assert_eq!(current.id, "team");
        assert_eq!(ctx.current_calendar().unwrap().summary, "Team");

        let saved = CurrentCalendar::load(&ctx.current_path).unwrap().unwrap();
        assert_eq!(saved, current);
    }

    #[tokio::test]
    async fn checkout_by_id_skips_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/calendarList/team"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": "team", "summary": "Team", "accessRole": "writer"}),
            ))
            .mount(&server)
            .await;
        let (mut ctx, _store, _dir) = context(&server, 99).await;

        assert_eq!(checkout(&mut ctx, Some("team".into())).await.unwrap().id, "team");
    }

    #[tokio::test]
    async fn create_requires_summary() {
        let server = MockServer::start().await;
        let (ctx, _store, _dir) = context(&server, 0).await;

        let err = create(&ctx, CalendarFields::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Input(_)));
    }

    #[tokio::test]
    async fn create_posts_resource() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars"))
            .and(body_json(json!({"summary": "Team", "timeZone": "Europe/Paris"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": "new-id", "summary": "Team", "timeZone": "Europe/Paris"}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        let (ctx, _store, _dir) = context(&server, 0).await;

        let fields = CalendarFields {
            summary: Some("Team".into()),
            timezone: Some("Europe/Paris".into()),
            ..Default::default()
        };
        let created = create(&ctx, fields).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("new-id"));
    }

    #[tokio::test]
    async fn update_keeps_old_summary() {
        let server = MockServer::start().await;
        mount_calendar_list(&server).await;
        Mock::given(method("PUT"))
            .and(path("/calendars/team"))
            .and(body_json(json!({"id": "team", "summary": "Team", "location": "Paris"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": "team", "summary": "Team", "location": "Paris"}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        let (ctx, _store, _dir) = context(&server, 1).await;

        let fields = CalendarFields {
            location: Some("Paris".into()),
            ..Default::default()
        };
        update(&ctx, None, fields).await.unwrap();
    }

    #[tokio::test]
    async fn delete_clears_matching_pointer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/calendarList/team"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": "team", "summary": "Team"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/calendars/team"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let (mut ctx, _store, _dir) = context_with_current(&server, 0, "team").await;

        delete(&mut ctx, Some("team".into())).await.unwrap();
        assert!(ctx.current_calendar().is_err());
    }

    #[tokio::test]
    async fn unauthorized_refreshes_and_asks_for_rerun() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"error": {"code": 401, "message": "Invalid Credentials"}}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        let (ctx, store, _dir) = context(&server, 0).await;

        let err = list(&ctx, false).await.unwrap_err();
        assert!(matches!(err, ClientError::TokenRefreshed));
        assert_eq!(
            store.get(StoreKey::AccessToken).await.unwrap().as_deref(),
            Some("ya29.fresh")
        );
    }

    #[tokio::test]
    async fn other_failures_are_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let (ctx, _store, _dir) = context(&server, 0).await;

        assert!(matches!(
            list(&ctx, true).await.unwrap_err(),
            ClientError::Provider(_)
        ));
    }
}
