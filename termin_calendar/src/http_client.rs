//! `HttpCalendarClient`: the sole production `CalendarClient`, talking to
//! the external calendar collaborator over HTTP. Request
//! shape and error handling mirror the provider idiom in this workspace's
//! LLM clients (`handle_http_response`-style status check before decode).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use termin_core::{CalendarClient, CalendarError, CalendarEventDraft, CalendarName};
use tracing::warn;

/// Two logical calendars, resolved to remote calendar names from
/// configuration.
pub struct HttpCalendarClient {
    http: Client,
    base_url: String,
    confirmed_name: String,
    suggested_name: String,
}

impl HttpCalendarClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, confirmed_name: String, suggested_name: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            confirmed_name,
            suggested_name,
        }
    }

    fn calendar_name(&self, calendar: CalendarName) -> &str {
        match calendar {
            CalendarName::Confirmed => &self.confirmed_name,
            CalendarName::Suggested => &self.suggested_name,
        }
    }

    fn draft_to_json(draft: &CalendarEventDraft) -> serde_json::Value {
        json!({
            "title": draft.title,
            "start": draft.start.map(|t| t.to_rfc3339()),
            "end": draft.end.map(|t| t.to_rfc3339()),
            "all_day": draft.all_day,
            "date": draft.date.map(|d| d.to_string()),
            "attendees": draft.attendees,
            "description": draft.description,
            "reminders_minutes_before": draft
                .reminders
                .iter()
                .map(|d| -d.num_minutes())
                .collect::<Vec<_>>(),
        })
    }

    async fn handle_response(
        response: reqwest::Response,
    ) -> Result<serde_json::Value, CalendarError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "calendar collaborator returned an error");
            return Err(CalendarError::SyncFailure(anyhow::anyhow!(
                "calendar HTTP error: {status}"
            )));
        }
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| CalendarError::SyncFailure(e.into()))
    }
}

#[async_trait]
impl CalendarClient for HttpCalendarClient {
    async fn write(
        &self,
        calendar: CalendarName,
        event: &CalendarEventDraft,
    ) -> Result<String, CalendarError> {
        let calendar_name = self.calendar_name(calendar);
        let response = self
            .http
            .post(format!(
                "{}/calendars/{calendar_name}/events",
                self.base_url
            ))
            .json(&Self::draft_to_json(event))
            .send()
            .await
            .map_err(|e| CalendarError::SyncFailure(e.into()))?;

        let body = Self::handle_response(response).await?;
        body.get("uid")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                CalendarError::SyncFailure(anyhow::anyhow!(
                    "calendar write response missing uid"
                ))
            })
    }

    async fn update(
        &self,
        calendar: CalendarName,
        uid: &str,
        event: &CalendarEventDraft,
    ) -> Result<(), CalendarError> {
        let calendar_name = self.calendar_name(calendar);
        let response = self
            .http
            .put(format!(
                "{}/calendars/{calendar_name}/events/{uid}",
                self.base_url
            ))
            .json(&Self::draft_to_json(event))
            .send()
            .await
            .map_err(|e| CalendarError::SyncFailure(e.into()))?;
        Self::handle_response(response).await?;
        Ok(())
    }

    async fn delete(&self, calendar: CalendarName, uid: &str) -> Result<(), CalendarError> {
        let calendar_name = self.calendar_name(calendar);
        let response = self
            .http
            .delete(format!(
                "{}/calendars/{calendar_name}/events/{uid}",
                self.base_url
            ))
            .send()
            .await
            .map_err(|e| CalendarError::SyncFailure(e.into()))?;
        let status = response.status();
        if !status.is_success() && status.as_u16() != 404 {
            return Err(CalendarError::SyncFailure(anyhow::anyhow!(
                "calendar delete returned {status}"
            )));
        }
        Ok(())
    }
}
