//! `AppointmentStore`: the single writer of the `appointments` table
//! and home of the state machine and
//! the duplicate-or-update transaction.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use termin_core::util::{lock_key_hash, token_jaccard};
use termin_core::{Appointment, AppointmentStatus, Timing, TimingRepr};
use termin_entities::appointments;

use crate::convert::{appointment_from_model, appointment_to_active_model, status_to_str};
use crate::error::StoreError;
use crate::lock::LockRegistry;

/// Result of [`AppointmentStore::create_or_update`]: whether the candidate
/// became a new row or was folded into an existing one.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Appointment),
    Updated(Appointment),
}

impl CreateOutcome {
    #[must_use]
    pub const fn appointment(&self) -> &Appointment {
        match self {
            Self::Created(a) | Self::Updated(a) => a,
        }
    }
}

pub struct AppointmentStore {
    db: DatabaseConnection,
    locks: Arc<LockRegistry>,
}

impl AppointmentStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            locks: Arc::new(LockRegistry::new()),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Appointment, StoreError> {
        let model = appointments::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        appointment_from_model(model)
    }

    pub async fn list_for_chat(&self, chat_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let rows = appointments::Entity::find()
            .filter(appointments::Column::ChatId.eq(chat_id))
            .all(&self.db)
            .await?;
        rows.into_iter().map(appointment_from_model).collect()
    }

    fn date_bucket(appt: &Appointment) -> String {
        match appt.timing() {
            Some(Timing::Timed { start, .. }) => start.date().to_string(),
            Some(Timing::AllDay { date }) => date.to_string(),
            None => "unscheduled".to_string(),
        }
    }

    /// Acquire the row lock for `(chat_id, hash(title), date_bucket)`, then
    /// inside one transaction either fold `candidate` into the best-scoring
    /// same-day match (when its title overlap is at or above
    /// `duplicate_suppress_threshold`) or insert it as a new row routed to
    /// `Auto`/`Suggested` by `auto_threshold`.
    pub async fn create_or_update(
        &self,
        mut candidate: Appointment,
        auto_threshold: f64,
        duplicate_suppress_threshold: f64,
    ) -> Result<CreateOutcome, StoreError> {
        let bucket = Self::date_bucket(&candidate);
        let key = lock_key_hash(&candidate.chat_id, &candidate.title, &bucket);
        let _guard = self.locks.acquire(&key).await;

        let txn = self.db.begin().await?;

        let same_bucket = appointments::Entity::find()
            .filter(appointments::Column::ChatId.eq(candidate.chat_id.clone()))
            .filter(
                appointments::Column::Datetime
                    .eq(candidate.timing_repr.datetime)
                    .or(appointments::Column::Date.eq(candidate.timing_repr.date)),
            )
            .all(&txn)
            .await?;

        let best = same_bucket
            .into_iter()
            .map(|m| {
                let score = token_jaccard(&m.title, &candidate.title);
                (score, m)
            })
            .filter(|(score, _)| *score >= duplicate_suppress_threshold)
            .max_by(|a, b| a.0.total_cmp(&b.0));

        let outcome = if let Some((_, existing)) = best {
            let mut merged = appointment_from_model(existing)?;
            merged.timing_repr = candidate.timing_repr.clone();
            merged
                .participants
                .extend(candidate.participants.iter().cloned());
            merged
                .source_message_ids
                .extend(candidate.source_message_ids.iter().cloned());
            merged.confidence = candidate.confidence.max(merged.confidence);
            merged.reasoning = candidate.reasoning.clone();
            merged.updated_at = Utc::now();
            let am = appointment_to_active_model(&merged, false)?;
            appointments::Entity::update(am).exec(&txn).await?;
            CreateOutcome::Updated(merged)
        } else {
            candidate.status =
                AppointmentStatus::route_for_confidence(candidate.confidence, auto_threshold);
            let am = appointment_to_active_model(&candidate, false)?;
            appointments::Entity::insert(am).exec(&txn).await?;
            CreateOutcome::Created(candidate)
        };

        txn.commit().await?;
        Ok(outcome)
    }

    async fn save(&self, appt: &Appointment, pending_sync: bool) -> Result<(), StoreError> {
        let am = appointment_to_active_model(appt, pending_sync)?;
        appointments::Entity::update(am).exec(&self.db).await?;
        Ok(())
    }

    async fn set_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let mut appt = self.get(id).await?;
        appt.status = status;
        appt.updated_at = Utc::now();
        self.save(&appt, false).await?;
        Ok(appt)
    }

    pub async fn confirm(&self, id: &str) -> Result<Appointment, StoreError> {
        self.set_status(id, AppointmentStatus::Confirmed).await
    }

    pub async fn reject(&self, id: &str) -> Result<Appointment, StoreError> {
        self.set_status(id, AppointmentStatus::Rejected).await
    }

    /// Cancel an appointment. Confirmed appointments may still be cancelled;
    /// this does not guard against cancelling an already terminal row.
    pub async fn cancel(&self, id: &str) -> Result<Appointment, StoreError> {
        self.set_status(id, AppointmentStatus::Cancelled).await
    }

    /// Apply an edit correction without touching the state machine — left
    /// as a product-decision point rather than enforced here, since editing
    /// a row already in a terminal state is an unresolved policy question.
    pub async fn apply_edit(
        &self,
        id: &str,
        title: Option<String>,
        timing: Option<TimingRepr>,
    ) -> Result<Appointment, StoreError> {
        let mut appt = self.get(id).await?;
        if let Some(title) = title {
            appt.title = title;
        }
        if let Some(timing) = timing {
            appt.timing_repr = timing;
        }
        appt.updated_at = Utc::now();
        self.save(&appt, false).await?;
        Ok(appt)
    }

    /// Sweep `Suggested` appointments older than 30 days to `Skipped`.
    pub async fn expire_stale_suggestions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let cutoff = now - Duration::days(30);
        let stale = appointments::Entity::find()
            .filter(appointments::Column::Status.eq(status_to_str(AppointmentStatus::Suggested)))
            .filter(appointments::Column::CreatedAt.lte(cutoff))
            .all(&self.db)
            .await?;
        let count = stale.len() as u64;
        for model in stale {
            let mut appt = appointment_from_model(model)?;
            appt.status = AppointmentStatus::Skipped;
            appt.updated_at = now;
            self.save(&appt, false).await?;
        }
        Ok(count)
    }

    pub async fn mark_calendar_synced(&self, id: &str, calendar_uid: &str) -> Result<(), StoreError> {
        let mut appt = self.get(id).await?;
        appt.calendar_uid = Some(calendar_uid.to_string());
        appt.updated_at = Utc::now();
        self.save(&appt, false).await
    }

    /// Flag a row for the reconciliation pass after a `CalendarSyncFailure`.
    pub async fn mark_pending_sync(&self, id: &str) -> Result<(), StoreError> {
        let appt = self.get(id).await?;
        self.save(&appt, true).await
    }

    pub async fn pending_sync_rows(&self) -> Result<Vec<Appointment>, StoreError> {
        let rows = appointments::Entity::find()
            .filter(appointments::Column::PendingSync.eq(true))
            .all(&self.db)
            .await?;
        rows.into_iter().map(appointment_from_model).collect()
    }
}
