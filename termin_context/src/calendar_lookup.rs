//! Materializes the relative-phrase → ISO-date table shipped verbatim into
//! the cascade prompt so the LLM never performs date arithmetic itself.

use chrono::{Datelike, Days, NaiveDate, Weekday};

const WEEKDAY_NAMES_DE: [(Weekday, &str); 7] = [
    (Weekday::Mon, "montag"),
    (Weekday::Tue, "dienstag"),
    (Weekday::Wed, "mittwoch"),
    (Weekday::Thu, "donnerstag"),
    (Weekday::Fri, "freitag"),
    (Weekday::Sat, "samstag"),
    (Weekday::Sun, "sonntag"),
];

/// Build the lookup table covering `today` through `today + 14d`.
///
/// Covers `heute`, `morgen`, `übermorgen`, every `<weekday>` occurring in the
/// window, and the first `nächste <weekday>` / `übernächste <weekday>` /
/// `kommende <weekday>` for each weekday name (the next one strictly after
/// today, and the one after that).
#[must_use]
pub fn materialize(today: NaiveDate) -> Vec<(String, String)> {
    let mut table = Vec::new();
    table.push(("heute".to_string(), today.to_string()));
    if let Some(tomorrow) = today.checked_add_days(Days::new(1)) {
        table.push(("morgen".to_string(), tomorrow.to_string()));
    }
    if let Some(day_after) = today.checked_add_days(Days::new(2)) {
        table.push(("übermorgen".to_string(), day_after.to_string()));
    }

    for offset in 0..=14u64 {
        let Some(day) = today.checked_add_days(Days::new(offset)) else {
            continue;
        };
        if let Some((_, name)) = WEEKDAY_NAMES_DE.iter().find(|(wd, _)| *wd == day.weekday()) {
            table.push(((*name).to_string(), day.to_string()));
        }
    }

    for (weekday, name) in WEEKDAY_NAMES_DE {
        let occurrences = next_occurrences(today, weekday, 2);
        if let Some(first) = occurrences.first() {
            table.push((format!("nächste {name}"), first.to_string()));
            table.push((format!("kommende {name}"), first.to_string()));
        }
        if let Some(second) = occurrences.get(1) {
            table.push((format!("übernächste {name}"), second.to_string()));
        }
    }

    table
}

/// The next `count` dates strictly after `from` that fall on `weekday`.
fn next_occurrences(from: NaiveDate, weekday: Weekday, count: usize) -> Vec<NaiveDate> {
    let mut found = Vec::with_capacity(count);
    let mut cursor = from;
    while found.len() < count {
        let Some(next) = cursor.checked_add_days(Days::new(1)) else {
            break;
        };
        cursor = next;
        if cursor.weekday() == weekday {
            found.push(cursor);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_heute_morgen_uebermorgen() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).expect("valid date");
        let table = materialize(today);
        let get = |k: &str| table.iter().find(|(key, _)| key == k).map(|(_, v)| v.clone());
        assert_eq!(get("heute"), Some("2026-07-28".to_string()));
        assert_eq!(get("morgen"), Some("2026-07-29".to_string()));
        assert_eq!(get("übermorgen"), Some("2026-07-30".to_string()));
    }

    #[test]
    fn next_weekday_is_strictly_after_today() {
        // 2026-07-28 is a Tuesday.
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).expect("valid date");
        let table = materialize(today);
        let next_tuesday = table
            .iter()
            .find(|(k, _)| k == "nächste dienstag")
            .map(|(_, v)| v.clone());
        assert_eq!(next_tuesday, Some("2026-08-04".to_string()));
    }
}
