//! Text output for calendar and event listings.

use std::fmt::Write;

use gcal_core::{CalendarSummary, EventSummary, render_table};

const RULE_WIDTH: usize = 60;

/// One `key: value` block per calendar, separated by rules.
pub fn calendar_list(calendars: &[CalendarSummary]) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::from("List of calendars:\n");
    for cal in calendars {
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "id: {}", cal.id);
        let _ = writeln!(out, "summary: {}", cal.summary);
        let _ = writeln!(out, "timezone: {}", cal.timezone.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "primary: {}", cal.primary);
        let _ = writeln!(out, "role: {}", cal.role.as_deref().unwrap_or("-"));
    }
    let _ = writeln!(out, "{}", rule);
    out
}

pub fn calendar_table(calendars: &[CalendarSummary]) -> String {
    let rows: Vec<Vec<String>> = calendars
        .iter()
        .map(|cal| {
            vec![
                cal.id.clone(),
                cal.summary.clone(),
                cal.timezone.clone().unwrap_or_default(),
                cal.primary.to_string(),
                cal.role.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&["ID", "Summary", "Timezone", "Primary", "Role"], &rows)
}

/// Numbered event listing with previews of description and location.
pub fn event_list(events: &[EventSummary]) -> String {
    if events.is_empty() {
        return "No events found\n".to_string();
    }
    let mut out = String::new();
    for (i, event) in events.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} - {}",
            i + 1,
            event.summary,
            event.description_preview()
        );
        let _ = writeln!(out, "{} -- {}", event.start, event.end);
        let _ = writeln!(out, "@ {}", event.location_preview());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use gcal_core::EventTime;

    use super::*;

    fn calendars() -> Vec<CalendarSummary> {
        let mut primary = CalendarSummary::new("me@example.com", "Me");
        primary.primary = true;
        primary.role = Some("owner".into());
        primary.timezone = Some("Europe/Paris".into());
        vec![primary, CalendarSummary::new("team", "Team")]
    }

    #[test]
    fn list_has_one_block_per_calendar() {
        let out = calendar_list(&calendars());
        assert_eq!(out.matches(&"-".repeat(RULE_WIDTH)).count(), 3);
        assert!(out.contains("primary: true"));
        assert!(out.contains("role: -"));
    }

    #[test]
    fn table_has_header_and_rows() {
        let out = calendar_table(&calendars());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[2].contains("Europe/Paris"));
    }

    #[test]
    fn events_show_placeholders_and_truncation() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let event = EventSummary {
            id: "e1".into(),
            summary: "Offsite".into(),
            description: Some("x".repeat(80)),
            location: None,
            start: EventTime::AllDay(day),
            end: EventTime::AllDay(day),
            color_id: None,
        };
        let out = event_list(&[event]);
        assert!(out.starts_with("1. Offsite - "));
        assert!(out.contains(&format!("{}...", "x".repeat(50))));
        assert!(out.contains("@ Location not specified"));
        assert!(out.contains("06/01/2025 -- 06/01/2025"));
    }

    #[test]
    fn no_events_message() {
        assert_eq!(event_list(&[]), "No events found\n");
    }
}
