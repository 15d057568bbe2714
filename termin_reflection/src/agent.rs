//! `ReflectionAgent`: a periodic, globally-singleton pass
//! over the last day's activity that proposes person-profile updates
//! through a high-capability model, distinct from the per-message cascade.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use termin_config::Config;
use termin_core::{Appointment, CascadePrompt, FeedbackRecord, LlmProvider, Message, Person};
use termin_person::PersonStore;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::ReflectionError;
use crate::{lock, query, schema};

const MESSAGE_LIMIT: u64 = 50;
const INVOKE_TIMEOUT: Duration = Duration::from_secs(90);

const MISSION_STATEMENT: &str = "Du bist ein reflektierender Analyst für familiäre \
Personenprofile. Deine wichtigste Eigenschaft ist Demut: du kennst die Familie schlechter als \
sie sich selbst. Alles, was nicht ausdrücklich von einer Person bestätigt wurde, gehört nach \
`confidence_notes` oder `new_facts` als vorsichtige Vermutung — niemals als gesicherte Tatsache. \
Erfinde niemals eine Person, die nicht in den Profilen vorkommt, überschreibe niemals vorhandene \
Fakten, und entferne niemals unsichere Einträge (sie altern nur über die Ringpuffer-Kapazität \
aus). Antworte ausschließlich mit einem JSON-Objekt der Form {\"updates\": {\"<person_key>\": \
{\"new_facts\": [string], \"new_activities\": {\"<name>\": {\"type\": string, \"pattern\": \
string, \"termin_logic\": [string]}}, \"new_termin_hints\": [string], \"confidence_notes\": \
[string]}}, \"meta\": {\"gaps_identified\": [string]}}. Lasse `updates` leer, wenn nichts Neues \
zu lernen war.";

/// Outcome of one reflection cycle, reported by the `reflect` CLI surface.
#[derive(Debug, Clone, Default)]
pub struct ReflectionOutcome {
    pub persons_updated: usize,
    pub persons_skipped_unknown: usize,
    pub gaps_identified: Vec<String>,
}

pub struct ReflectionAgent {
    db: DatabaseConnection,
    persons: Arc<Mutex<PersonStore>>,
    provider: Option<Arc<dyn LlmProvider>>,
    profiles_dir: std::path::PathBuf,
    lock_ttl: Duration,
}

impl ReflectionAgent {
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        persons: Arc<Mutex<PersonStore>>,
        provider: Option<Arc<dyn LlmProvider>>,
        config: &Config,
    ) -> Self {
        Self {
            db,
            persons,
            provider,
            profiles_dir: config.profiles_dir.clone(),
            lock_ttl: Duration::from_secs(config.reflection.lock_ttl_min * 60),
        }
    }

    /// Run one reflection cycle end to end.
    /// Acquires the singleton file lock for the duration of the cycle and
    /// releases it on return, including on error.
    pub async fn run_cycle(&self) -> Result<ReflectionOutcome, ReflectionError> {
        let _guard = lock::acquire(&self.profiles_dir, self.lock_ttl)?;
        let provider = self.provider.as_ref().ok_or(ReflectionError::NoProvider)?;

        let now = Utc::now();
        let messages = query::recent_messages(&self.db, now, MESSAGE_LIMIT).await?;
        let appointments = query::recent_appointments(&self.db, now).await?;
        let feedback = query::recent_feedback(&self.db, now).await?;

        let persons_guard = self.persons.lock().await;
        let profiles_block = render_profiles(persons_guard.all());
        drop(persons_guard);

        let prompt = build_prompt(&messages, &appointments, &feedback, &profiles_block);
        let raw = provider.invoke(&prompt, INVOKE_TIMEOUT).await?;

        let Some(response) = schema::parse(&raw) else {
            warn!("reflection response carried no parseable JSON, treating cycle as a no-op");
            return Ok(ReflectionOutcome::default());
        };

        let mut outcome = ReflectionOutcome {
            gaps_identified: response.meta.gaps_identified,
            ..ReflectionOutcome::default()
        };

        let mut persons_guard = self.persons.lock().await;
        for (key, update) in response.updates {
            if persons_guard.get(&key).is_none() {
                warn!(person = %key, "reflection proposed an update for an unknown person, skipping");
                outcome.persons_skipped_unknown += 1;
                continue;
            }
            persons_guard.apply_reflection_update(
                &key,
                update.new_facts,
                update.new_activities.into_iter(),
                update.new_termin_hints,
                update.confidence_notes,
            )?;
            outcome.persons_updated += 1;
        }

        info!(
            updated = outcome.persons_updated,
            skipped = outcome.persons_skipped_unknown,
            gaps = outcome.gaps_identified.len(),
            "reflection cycle complete"
        );
        Ok(outcome)
    }
}

/// A plain per-person text block: name, role, facts, activities, termin
/// hints, and the most recent uncertain entries. Deliberately separate from
/// `termin_context::profile`'s renderer — reflection always sees every
/// profile in full, not just the ones detected in one message.
fn render_profiles<'a>(people: impl Iterator<Item = &'a Person>) -> String {
    let mut blocks: Vec<String> = people
        .map(|p| {
            let mut lines = vec![format!("Key: {} | Name: {} | Rolle: {}", p.key, p.name, p.role)];
            if !p.facts.is_empty() {
                lines.push(format!("Fakten: {}", p.facts.join("; ")));
            }
            if !p.activities.is_empty() {
                let activities = p
                    .activities
                    .iter()
                    .map(|(name, a)| format!("{name} ({}): {}", a.kind, a.pattern))
                    .collect::<Vec<_>>()
                    .join("; ");
                lines.push(format!("Aktivitäten: {activities}"));
            }
            if !p.termin_hints.is_empty() {
                lines.push(format!("Termin-Hinweise: {}", p.termin_hints.join("; ")));
            }
            if !p.uncertain.is_empty() {
                lines.push(format!("Unsicher: {}", p.uncertain.latest(5).join("; ")));
            }
            lines.join("\n")
        })
        .collect();
    blocks.sort();
    blocks.join("\n\n")
}

fn build_prompt(
    messages: &[Message],
    appointments: &[Appointment],
    feedback: &[FeedbackRecord],
    profiles_block: &str,
) -> CascadePrompt {
    let mut sections = Vec::new();

    if !profiles_block.is_empty() {
        sections.push(format!("Aktuelle Personenprofile:\n{profiles_block}"));
    }

    if !messages.is_empty() {
        let rendered = messages
            .iter()
            .map(|m| format!("[{}] {}: {}", m.chat_id, m.sender, m.text))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Nachrichten der letzten 24h:\n{rendered}"));
    }

    if !appointments.is_empty() {
        let rendered = appointments
            .iter()
            .map(|a| format!("- {} ({:?}, {:?})", a.title, a.category, a.status))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Termine der letzten 24h:\n{rendered}"));
    }

    if !feedback.is_empty() {
        let rendered = feedback
            .iter()
            .map(|f| format!("- Termin {} : {:?}", f.appointment_id, f.action))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Korrekturen der letzten 7 Tage:\n{rendered}"));
    }

    let grouped: BTreeMap<&str, usize> = appointments.iter().fold(BTreeMap::new(), |mut acc, a| {
        *acc.entry(a.chat_id.as_str()).or_insert(0) += 1;
        acc
    });
    if !grouped.is_empty() {
        let summary = grouped
            .iter()
            .map(|(chat, count)| format!("{chat}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        sections.push(format!("Termine je Chat: {summary}"));
    }

    CascadePrompt {
        system: MISSION_STATEMENT.to_string(),
        user: sections.join("\n\n"),
    }
}
