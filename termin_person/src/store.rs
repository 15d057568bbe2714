//! `PersonStore`: loads and persists the per-person YAML profiles that back
//! person detection, relevance inference, and reflection.

use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use termin_core::Person;
use tracing::{info, warn};

use crate::error::PersonError;

pub struct PersonStore {
    dir: PathBuf,
    people: HashMap<String, Person>,
}

impl PersonStore {
    /// Load every `*.yaml` profile in `dir`, keyed by `Person::key`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, PersonError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(PersonError::MissingDir(dir));
        }

        let mut people = HashMap::new();
        for entry in fs::read_dir(&dir).map_err(|source| PersonError::Read {
            path: dir.clone(),
            source,
        })? {
            let entry = entry.map_err(|source| PersonError::Read {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let raw = fs::read_to_string(&path).map_err(|source| PersonError::Read {
                path: path.clone(),
                source,
            })?;
            let person: Person =
                serde_yaml::from_str(&raw).map_err(|source| PersonError::Parse { path, source })?;
            people.insert(person.key.clone(), person);
        }

        info!(count = people.len(), dir = %dir.display(), "loaded person profiles");
        Ok(Self { dir, people })
    }

    /// Re-read every profile from disk, discarding in-memory state. Used
    /// when another process (e.g. `ReflectionAgent`) may have written new
    /// profiles since the last load.
    pub fn reload(&mut self) -> Result<(), PersonError> {
        *self = Self::load(&self.dir)?;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Person> {
        self.people.get(key)
    }

    #[must_use]
    pub fn all(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    /// Every person whose name or alias occurs as a whole word in `text`,
    /// case-insensitively.
    #[must_use]
    pub fn detect(&self, text: &str) -> Vec<&Person> {
        self.people
            .values()
            .filter(|p| p.all_names().into_iter().any(|name| contains_word(text, name)))
            .collect()
    }

    /// Confirm an uncertain observation as fact, driven by a
    /// `confirmed`/`edited` feedback record naming this observation.
    pub fn apply_feedback(&mut self, key: &str, observation: &str) -> Result<(), PersonError> {
        let person = self
            .people
            .get_mut(key)
            .ok_or_else(|| PersonError::UnknownPerson(key.to_string()))?;
        person.promote_to_fact(observation);
        self.save(key)
    }

    /// Append reflection-derived observations to `uncertain`. Never edits or
    /// removes `facts`.
    pub fn apply_reflection(
        &mut self,
        key: &str,
        observations: impl IntoIterator<Item = String>,
    ) -> Result<(), PersonError> {
        self.observe_uncertain(key, observations)
    }

    /// Apply a reflection agent's structured per-person update: new facts
    /// and confidence notes both land in `uncertain` (reflection proposes,
    /// it never confirms), new activities are merged additively, and new
    /// termin hints are appended. `facts` itself is never touched here.
    pub fn apply_reflection_update(
        &mut self,
        key: &str,
        new_facts: impl IntoIterator<Item = String>,
        new_activities: impl IntoIterator<Item = (String, termin_core::Activity)>,
        new_termin_hints: impl IntoIterator<Item = String>,
        confidence_notes: impl IntoIterator<Item = String>,
    ) -> Result<(), PersonError> {
        let person = self
            .people
            .get_mut(key)
            .ok_or_else(|| PersonError::UnknownPerson(key.to_string()))?;

        for observation in new_facts.into_iter().chain(confidence_notes) {
            person.add_uncertain(observation);
        }
        for (name, activity) in new_activities {
            person.merge_activity(name, activity);
        }
        for hint in new_termin_hints {
            person.add_termin_hint(hint);
        }

        self.save(key)
    }

    /// Append unverified observations to `uncertain`, deduplicated against
    /// both `uncertain` and `facts`. Shared by
    /// `apply_reflection` and `termin_feedback::FeedbackLoop`'s `edited`
    /// path — both discover single-source observations that are not yet
    /// confirmed.
    pub fn observe_uncertain(
        &mut self,
        key: &str,
        observations: impl IntoIterator<Item = String>,
    ) -> Result<(), PersonError> {
        let person = self
            .people
            .get_mut(key)
            .ok_or_else(|| PersonError::UnknownPerson(key.to_string()))?;
        for observation in observations {
            person.add_uncertain(observation);
        }
        self.save(key)
    }

    /// Write `key`'s profile back to disk: an exclusively-locked, atomic
    /// rename-into-place write so a reader never observes a half-written
    /// file.
    fn save(&self, key: &str) -> Result<(), PersonError> {
        let person = self
            .people
            .get(key)
            .ok_or_else(|| PersonError::UnknownPerson(key.to_string()))?;
        let path = self.dir.join(format!("{key}.yaml"));

        let lock_path = self.dir.join(format!(".{key}.lock"));
        let lock_file = fs::File::create(&lock_path).map_err(|source| PersonError::Write {
            path: lock_path.clone(),
            source,
        })?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| PersonError::Locked(path.clone()))?;

        let yaml = serde_yaml::to_string(person).map_err(|source| PersonError::Parse {
            path: path.clone(),
            source,
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|source| PersonError::Write {
            path: path.clone(),
            source,
        })?;
        tmp.write_all(yaml.as_bytes())
            .map_err(|source| PersonError::Write {
                path: path.clone(),
                source,
            })?;
        tmp.persist(&path)
            .map_err(|e| PersonError::Write {
                path: path.clone(),
                source: e.error,
            })?;

        if let Err(err) = fs2::FileExt::unlock(&lock_file) {
            warn!(%err, path = %lock_path.display(), "failed to release person profile lock");
        }
        let _ = fs::remove_file(&lock_path);

        Ok(())
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use termin_core::UncertainRing;

    fn write_person(dir: &Path, key: &str) {
        let person = Person {
            key: key.to_string(),
            name: "Romy".to_string(),
            role: "daughter".to_string(),
            aliases: ["Röschen".to_string()].into_iter().collect(),
            facts: vec!["allergic to peanuts".to_string()],
            activities: std::collections::BTreeMap::new(),
            termin_hints: vec![],
            uncertain: UncertainRing::default(),
            is_child: true,
        };
        let yaml = serde_yaml::to_string(&person).unwrap();
        fs::write(dir.join(format!("{key}.yaml")), yaml).unwrap();
    }

    #[test]
    fn detect_matches_name_and_alias_as_whole_words() {
        let dir = tempfile::tempdir().unwrap();
        write_person(dir.path(), "romy");
        let store = PersonStore::load(dir.path()).unwrap();

        assert_eq!(store.detect("Romy hat morgen Training").len(), 1);
        assert_eq!(store.detect("Röschen kommt später").len(), 1);
        assert!(store.detect("Romysticism is not a word").is_empty());
    }

    #[test]
    fn apply_feedback_promotes_uncertain_to_fact_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        write_person(dir.path(), "romy");
        let mut store = PersonStore::load(dir.path()).unwrap();
        store
            .people
            .get_mut("romy")
            .unwrap()
            .add_uncertain("takes piano lessons on Tuesdays".to_string());

        store
            .apply_feedback("romy", "takes piano lessons on Tuesdays")
            .unwrap();

        store.reload().unwrap();
        let romy = store.get("romy").unwrap();
        assert!(romy.facts.contains(&"takes piano lessons on Tuesdays".to_string()));
        assert!(romy.uncertain.is_empty());
    }

    #[test]
    fn apply_reflection_never_touches_facts() {
        let dir = tempfile::tempdir().unwrap();
        write_person(dir.path(), "romy");
        let mut store = PersonStore::load(dir.path()).unwrap();

        store
            .apply_reflection("romy", vec!["might be starting a new sport".to_string()])
            .unwrap();

        store.reload().unwrap();
        let romy = store.get("romy").unwrap();
        assert_eq!(romy.facts, vec!["allergic to peanuts".to_string()]);
        assert!(romy.uncertain.contains("might be starting a new sport"));
    }
}
