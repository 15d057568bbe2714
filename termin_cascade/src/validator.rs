//! `ExtractionValidator`: normalizes and checks raw LLM actions against the
//! eight rules that decide what is actually worth writing as an
//! appointment. Rules run in order, each either mutating an action in place
//! or dropping it; an action that survives all eight is ready for
//! `AppointmentStore`.

use chrono::{Duration as ChronoDuration, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use termin_core::{ActionKind, Appointment, AppointmentAction, Message, Relevance};
use termin_person::PersonStore;

pub struct ValidationContext<'a> {
    pub message: &'a Message,
    pub zone: Tz,
    pub user_name: &'a str,
    pub partner_name: &'a str,
    pub existing_appointments: &'a [Appointment],
    pub duplicate_threshold: f64,
    pub duplicate_suppress_threshold: f64,
    pub persons: &'a PersonStore,
}

#[allow(clippy::expect_used)]
static VON_BIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)von\s+(\d{1,2}(?::\d{2})?)\s*(?:uhr)?\s*bis\s+(\d{1,2}(?::\d{2})?)\s*(?:uhr)?")
        .expect("valid regex")
});
#[allow(clippy::expect_used)]
static BIS_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbis\s+(\d{1,2}(?::\d{2})?)\s*(?:uhr)?").expect("valid regex")
});
#[allow(clippy::expect_used)]
static PREP_TASK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(einpacken|kaufen|backen|vorbereiten)$").expect("valid regex")
});

/// Run all eight rules in order over `actions`, dropping whatever fails and
/// returning the survivors.
#[must_use]
pub fn validate(actions: Vec<AppointmentAction>, ctx: &ValidationContext<'_>) -> Vec<AppointmentAction> {
    actions
        .into_iter()
        .filter_map(|action| rule_1_schema_shape(action))
        .map(rule_2_time_normalization)
        .filter_map(|action| rule_3_past_suppression(action, ctx))
        .map(|action| rule_4_end_vs_start(action, ctx))
        .filter_map(|action| rule_5_prep_task_suppression(action, ctx))
        .map(|action| rule_6_relevance_inference(action, ctx))
        .filter_map(|action| rule_7_duplicate_or_update(action, ctx))
        .map(rule_8_confidence_clamp)
        .collect()
}

/// Rule 1: discard actions missing `action`, `title`, or both of
/// `datetime`/`all_day+date`.
fn rule_1_schema_shape(action: AppointmentAction) -> Option<AppointmentAction> {
    if action.action.is_none() || action.title.is_none() {
        return None;
    }
    let has_timing = action.datetime.is_some() || (action.all_day && action.date.is_some());
    if !has_timing {
        return None;
    }
    Some(action)
}

/// Rule 2: an action with only a date and no time is all-day.
fn rule_2_time_normalization(mut action: AppointmentAction) -> AppointmentAction {
    if action.datetime.is_none() && action.date.is_some() {
        action.all_day = true;
    }
    action
}

fn resolved_start(action: &AppointmentAction) -> Option<NaiveDateTime> {
    action
        .datetime
        .or_else(|| action.date.and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Rule 3: reject actions whose resolved start is earlier than the
/// message's timestamp minus 24h, in the configured local zone.
fn rule_3_past_suppression(
    action: AppointmentAction,
    ctx: &ValidationContext<'_>,
) -> Option<AppointmentAction> {
    let Some(start) = resolved_start(&action) else {
        return Some(action);
    };
    let Some(local_start) = ctx.zone.from_local_datetime(&start).single() else {
        return Some(action);
    };
    let cutoff = ctx.message.timestamp - ChronoDuration::hours(24);
    if local_start.with_timezone(&chrono::Utc) < cutoff {
        return None;
    }
    Some(action)
}

/// Rule 4: "bis <time>" without a start fills `end_datetime`; "von X bis Y"
/// fills both, with X as the start.
fn rule_4_end_vs_start(mut action: AppointmentAction, ctx: &ValidationContext<'_>) -> AppointmentAction {
    let haystack = format!(
        "{} {}",
        action.title.as_deref().unwrap_or_default(),
        ctx.message.text
    );

    if let Some(caps) = VON_BIS.captures(&haystack) {
        if let (Some(start_date), Some(start), Some(end)) = (
            action.date.or_else(|| action.datetime.map(|dt| dt.date())),
            parse_clock(&caps[1]),
            parse_clock(&caps[2]),
        ) {
            action.datetime = start_date.and_time(start).into();
            action.end_datetime = start_date.and_time(end).into();
            action.all_day = false;
        }
        return action;
    }

    if action.datetime.is_none() {
        if let Some(caps) = BIS_ONLY.captures(&haystack) {
            if let (Some(date), Some(end)) = (
                action.date.or_else(|| action.datetime.map(|dt| dt.date())),
                parse_clock(&caps[1]),
            ) {
                action.end_datetime = date.and_time(end).into();
            }
        }
    }

    action
}

fn parse_clock(raw: &str) -> Option<chrono::NaiveTime> {
    if raw.contains(':') {
        chrono::NaiveTime::parse_from_str(raw, "%H:%M").ok()
    } else {
        raw.parse::<u32>()
            .ok()
            .and_then(|hour| chrono::NaiveTime::from_hms_opt(hour, 0, 0))
    }
}

/// Rule 5: a prep-task title ("X einpacken") whose event `X` overlaps an
/// existing appointment's title is demoted — not written at all.
fn rule_5_prep_task_suppression(
    action: AppointmentAction,
    ctx: &ValidationContext<'_>,
) -> Option<AppointmentAction> {
    let Some(title) = action.title.as_deref() else {
        return Some(action);
    };
    let Some(caps) = PREP_TASK.captures(title) else {
        return Some(action);
    };
    let event_stem = caps[1].trim();

    let overlaps_existing = ctx
        .existing_appointments
        .iter()
        .any(|existing| termin_core::util::token_jaccard(event_stem, &existing.title) >= 0.34);

    if overlaps_existing {
        None
    } else {
        Some(action)
    }
}

/// Rule 6: force `shared` for any child referenced; otherwise infer from
/// whether only the partner, only the user, or neither/both are named.
fn rule_6_relevance_inference(
    mut action: AppointmentAction,
    ctx: &ValidationContext<'_>,
) -> AppointmentAction {
    let mut haystack = format!(
        "{} {} {}",
        action.title.as_deref().unwrap_or_default(),
        ctx.message.text,
        action.participants.iter().cloned().collect::<Vec<_>>().join(" ")
    );
    haystack.make_ascii_lowercase();

    let any_child_referenced = ctx
        .persons
        .detect(&haystack)
        .into_iter()
        .any(|person| person.is_child);

    action.relevance = Some(if any_child_referenced {
        Relevance::Shared
    } else {
        let mentions_partner = contains_word(&haystack, ctx.partner_name);
        let mentions_user = contains_word(&haystack, ctx.user_name);
        match (mentions_partner, mentions_user) {
            (true, false) => Relevance::PartnerOnly,
            (false, true) => Relevance::ForMe,
            _ => Relevance::Shared,
        }
    });

    action
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let needle = needle.to_lowercase();
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == needle)
}

/// Rule 7: for a `create` action, compare against existing appointments in
/// a 14-day window around the resolved start. A near-identical match with
/// score `>= duplicate_suppress_threshold` drops the action; a weaker but
/// still substantial match with `>= duplicate_threshold` rewrites it to
/// `update` against that appointment's id (unless the LLM already picked
/// one).
fn rule_7_duplicate_or_update(
    mut action: AppointmentAction,
    ctx: &ValidationContext<'_>,
) -> Option<AppointmentAction> {
    if action.action != Some(ActionKind::Create) {
        return Some(action);
    }
    let Some(start) = resolved_start(&action) else {
        return Some(action);
    };
    let title = action.title.as_deref().unwrap_or_default();

    let best = ctx
        .existing_appointments
        .iter()
        .filter_map(|existing| {
            let existing_start = existing
                .timing_repr
                .datetime
                .or_else(|| existing.timing_repr.date.and_then(|d| d.and_hms_opt(0, 0, 0)))?;
            let delta = (start - existing_start).num_minutes().abs();
            if delta > 14 * 24 * 60 {
                return None;
            }
            let title_overlap = termin_core::util::token_jaccard(title, &existing.title);
            let time_match = f64::from(u8::from(delta < 30));
            let score = 0.5 * title_overlap + 0.5 * time_match;
            Some((existing, score))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1));

    let Some((existing, score)) = best else {
        return Some(action);
    };

    if score >= ctx.duplicate_suppress_threshold {
        return None;
    }
    if score >= ctx.duplicate_threshold && action.updates_termin_id.is_none() {
        action.action = Some(ActionKind::Update);
        action.updates_termin_id = Some(existing.id.clone());
    }
    Some(action)
}

/// Rule 8: clamp confidence to `[0.0, 1.0]`, defaulting missing values to
/// 0.5 and capping synthesized (natural-language-fallback) actions at 0.4.
fn rule_8_confidence_clamp(mut action: AppointmentAction) -> AppointmentAction {
    let mut confidence = action.confidence.unwrap_or(0.5).clamp(0.0, 1.0);
    if action.synthesized {
        confidence = confidence.min(0.4);
    }
    action.confidence = Some(confidence);
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeSet;
    use termin_core::{AppointmentStatus, Category, TimingRepr};

    fn base_action() -> AppointmentAction {
        AppointmentAction {
            action: Some(ActionKind::Create),
            title: Some("Enno Training".to_string()),
            datetime: NaiveDate::from_ymd_opt(2026, 7, 30)
                .unwrap()
                .and_hms_opt(15, 0, 0),
            confidence: Some(0.9),
            ..AppointmentAction::default()
        }
    }

    fn message() -> Message {
        Message {
            message_id: "m1".into(),
            chat_id: "c1".into(),
            sender: "Alex".into(),
            text: "Enno hat morgen Training".into(),
            timestamp: chrono::DateTime::parse_from_rfc3339("2026-07-29T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            reply_to: None,
        }
    }

    fn person_store() -> PersonStore {
        let dir = tempfile::tempdir().unwrap();
        let person = termin_core::Person {
            key: "enno".into(),
            name: "Enno".into(),
            role: "son".into(),
            aliases: BTreeSet::new(),
            facts: vec![],
            activities: std::collections::BTreeMap::new(),
            termin_hints: vec![],
            uncertain: termin_core::UncertainRing::default(),
            is_child: true,
        };
        std::fs::write(
            dir.path().join("enno.yaml"),
            serde_yaml::to_string(&person).unwrap(),
        )
        .unwrap();
        PersonStore::load(dir.path()).unwrap()
    }

    fn ctx<'a>(message: &'a Message, persons: &'a PersonStore, existing: &'a [Appointment]) -> ValidationContext<'a> {
        ValidationContext {
            message,
            zone: chrono_tz::Europe::Berlin,
            user_name: "Alex",
            partner_name: "Sam",
            existing_appointments: existing,
            duplicate_threshold: 0.7,
            duplicate_suppress_threshold: 0.9,
            persons,
        }
    }

    #[test]
    fn rule_1_drops_action_missing_title() {
        let mut action = base_action();
        action.title = None;
        assert!(rule_1_schema_shape(action).is_none());
    }

    #[test]
    fn rule_1_drops_action_with_no_timing() {
        let mut action = base_action();
        action.datetime = None;
        assert!(rule_1_schema_shape(action).is_none());
    }

    #[test]
    fn rule_2_sets_all_day_when_only_date_given() {
        let mut action = base_action();
        action.datetime = None;
        action.date = NaiveDate::from_ymd_opt(2026, 7, 30);
        let action = rule_2_time_normalization(action);
        assert!(action.all_day);
    }

    #[test]
    fn rule_3_drops_past_action() {
        let msg = message();
        let persons = person_store();
        let v = ctx(&msg, &persons, &[]);
        let mut action = base_action();
        action.datetime = NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0);
        assert!(rule_3_past_suppression(action, &v).is_none());
    }

    #[test]
    fn rule_3_keeps_near_future_action() {
        let msg = message();
        let persons = person_store();
        let v = ctx(&msg, &persons, &[]);
        let action = base_action();
        assert!(rule_3_past_suppression(action, &v).is_some());
    }

    #[test]
    fn rule_4_fills_end_from_bis_only() {
        let mut msg = message();
        msg.text = "Training bis 17:00".to_string();
        let persons = person_store();
        let v = ctx(&msg, &persons, &[]);
        let mut action = base_action();
        action.datetime = None;
        action.date = Some(NaiveDate::from_ymd_opt(2026, 7, 30).unwrap());
        let action = rule_4_end_vs_start(action, &v);
        assert!(action.end_datetime.is_some());
        assert_eq!(action.end_datetime.unwrap().time(), chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap());
    }

    #[test]
    fn rule_4_von_bis_sets_both_start_and_end() {
        let mut msg = message();
        msg.text = "Termin von 14:00 bis 15:30".to_string();
        let persons = person_store();
        let v = ctx(&msg, &persons, &[]);
        let mut action = base_action();
        action.date = Some(NaiveDate::from_ymd_opt(2026, 7, 30).unwrap());
        let action = rule_4_end_vs_start(action, &v);
        assert_eq!(action.datetime.unwrap().time(), chrono::NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(action.end_datetime.unwrap().time(), chrono::NaiveTime::from_hms_opt(15, 30, 0).unwrap());
    }

    #[test]
    fn rule_5_suppresses_prep_task_near_existing_event() {
        let msg = message();
        let persons = person_store();
        let existing = vec![Appointment {
            id: "a1".into(),
            chat_id: "c1".into(),
            title: "Enno Geburtstag".into(),
            timing_repr: TimingRepr {
                date: NaiveDate::from_ymd_opt(2026, 7, 31),
                all_day: true,
                ..TimingRepr::default()
            },
            participants: BTreeSet::new(),
            category: Category::Appointment,
            relevance: Relevance::Shared,
            status: AppointmentStatus::Auto,
            confidence: 0.9,
            source_message_ids: BTreeSet::new(),
            calendar_uid: None,
            reasoning: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];
        let v = ctx(&msg, &persons, &existing);
        let mut action = base_action();
        action.title = Some("Geschenk für Enno Geburtstag einpacken".to_string());
        assert!(rule_5_prep_task_suppression(action, &v).is_none());
    }

    #[test]
    fn rule_5_keeps_unrelated_prep_task() {
        let msg = message();
        let persons = person_store();
        let v = ctx(&msg, &persons, &[]);
        let mut action = base_action();
        action.title = Some("Brot backen".to_string());
        assert!(rule_5_prep_task_suppression(action, &v).is_some());
    }

    #[test]
    fn rule_6_forces_shared_for_child() {
        let msg = message();
        let persons = person_store();
        let v = ctx(&msg, &persons, &[]);
        let action = rule_6_relevance_inference(base_action(), &v);
        assert_eq!(action.relevance, Some(Relevance::Shared));
    }

    #[test]
    fn rule_6_infers_partner_only() {
        let mut msg = message();
        msg.text = "Sam hat morgen einen Arzttermin".to_string();
        let persons = person_store();
        let v = ctx(&msg, &persons, &[]);
        let mut action = base_action();
        action.title = Some("Arzttermin".to_string());
        let action = rule_6_relevance_inference(action, &v);
        assert_eq!(action.relevance, Some(Relevance::PartnerOnly));
    }

    #[test]
    fn rule_7_rewrites_to_update_above_duplicate_threshold() {
        let msg = message();
        let persons = person_store();
        let existing = vec![Appointment {
            id: "a1".into(),
            chat_id: "c1".into(),
            title: "Enno Training".into(),
            timing_repr: TimingRepr {
                datetime: NaiveDate::from_ymd_opt(2026, 7, 30)
                    .unwrap()
                    .and_hms_opt(15, 10, 0),
                ..TimingRepr::default()
            },
            participants: BTreeSet::new(),
            category: Category::Appointment,
            relevance: Relevance::Shared,
            status: AppointmentStatus::Auto,
            confidence: 0.9,
            source_message_ids: BTreeSet::new(),
            calendar_uid: None,
            reasoning: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];
        let v = ctx(&msg, &persons, &existing);
        let action = rule_7_duplicate_or_update(base_action(), &v).unwrap();
        assert_eq!(action.action, Some(ActionKind::Update));
        assert_eq!(action.updates_termin_id.as_deref(), Some("a1"));
    }

    #[test]
    fn rule_8_defaults_missing_confidence_and_caps_synthesized() {
        let mut action = base_action();
        action.confidence = None;
        let action = rule_8_confidence_clamp(action);
        assert!((action.confidence.unwrap() - 0.5).abs() < f64::EPSILON);

        let mut synthesized = base_action();
        synthesized.confidence = Some(0.95);
        synthesized.synthesized = true;
        let synthesized = rule_8_confidence_clamp(synthesized);
        assert!(synthesized.confidence.unwrap() <= 0.4);
    }
}
