use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub providers: ProvidersConfig,
    #[serde(default = "default_database_config")]
    pub database: DatabaseConfig,
    #[serde(default = "default_memory_config")]
    pub memory: MemoryConfig,
    #[serde(default = "default_reflection_config")]
    pub reflection: ReflectionConfig,
    #[serde(default = "default_calendars_config")]
    pub calendars: CalendarsConfig,
    #[serde(default = "default_extraction_config")]
    pub extraction: ExtractionConfig,
    pub family: FamilyConfig,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub primary: ProviderConfig,
    pub fallback: ProviderConfig,
    /// High-capability model used by `ReflectionAgent`.
    #[serde(default)]
    pub reflection: Option<ProviderConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,
    #[serde(default = "default_memory_url")]
    pub url: String,
    #[serde(default = "default_recall_timeout_s")]
    pub recall_timeout_s: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReflectionConfig {
    #[serde(default = "default_reflection_interval_min")]
    pub interval_min: u64,
    #[serde(default = "default_reflection_lock_ttl_min")]
    pub lock_ttl_min: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CalendarsConfig {
    #[serde(default = "default_confirmed_calendar_name")]
    pub confirmed_name: String,
    #[serde(default = "default_suggested_calendar_name")]
    pub suggested_name: String,
    #[serde(default = "default_calendar_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_confidence_auto_threshold")]
    pub confidence_auto_threshold: f64,
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f64,
    #[serde(default = "default_duplicate_suppress_threshold")]
    pub duplicate_suppress_threshold: f64,
    #[serde(default = "default_conversation_window_size")]
    pub conversation_window_size: usize,
    #[serde(default = "default_existing_appointments_window_days")]
    pub existing_appointments_window_days: i64,
    #[serde(default = "default_max_existing")]
    pub max_existing: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FamilyConfig {
    pub user_name: String,
    pub partner_name: String,
    #[serde(default)]
    pub children_names: Vec<String>,
}

fn default_database_url() -> String {
    "sqlite://./termin.db?mode=rwc".to_string()
}

fn default_database_config() -> DatabaseConfig {
    DatabaseConfig {
        url: default_database_url(),
    }
}

const fn default_memory_enabled() -> bool {
    false
}

fn default_memory_url() -> String {
    "http://localhost:8700".to_string()
}

const fn default_recall_timeout_s() -> u64 {
    3
}

fn default_memory_config() -> MemoryConfig {
    MemoryConfig {
        enabled: default_memory_enabled(),
        url: default_memory_url(),
        recall_timeout_s: default_recall_timeout_s(),
    }
}

const fn default_reflection_interval_min() -> u64 {
    30
}

const fn default_reflection_lock_ttl_min() -> u64 {
    30
}

fn default_reflection_config() -> ReflectionConfig {
    ReflectionConfig {
        interval_min: default_reflection_interval_min(),
        lock_ttl_min: default_reflection_lock_ttl_min(),
    }
}

fn default_confirmed_calendar_name() -> String {
    "Familie Bestätigt".to_string()
}

fn default_suggested_calendar_name() -> String {
    "Familie Vorschläge".to_string()
}

fn default_calendar_base_url() -> String {
    "http://localhost:8800".to_string()
}

fn default_calendars_config() -> CalendarsConfig {
    CalendarsConfig {
        confirmed_name: default_confirmed_calendar_name(),
        suggested_name: default_suggested_calendar_name(),
        base_url: default_calendar_base_url(),
    }
}

const fn default_confidence_auto_threshold() -> f64 {
    0.85
}

const fn default_duplicate_threshold() -> f64 {
    0.7
}

const fn default_duplicate_suppress_threshold() -> f64 {
    0.9
}

const fn default_conversation_window_size() -> usize {
    10
}

const fn default_existing_appointments_window_days() -> i64 {
    60
}

const fn default_max_existing() -> usize {
    30
}

fn default_extraction_config() -> ExtractionConfig {
    ExtractionConfig {
        confidence_auto_threshold: default_confidence_auto_threshold(),
        duplicate_threshold: default_duplicate_threshold(),
        duplicate_suppress_threshold: default_duplicate_suppress_threshold(),
        conversation_window_size: default_conversation_window_size(),
        existing_appointments_window_days: default_existing_appointments_window_days(),
        max_existing: default_max_existing(),
    }
}

fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}

fn default_profiles_dir() -> PathBuf {
    config_dir().join("profiles")
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("termin")
}

impl Config {
    /// Load from `~/termin/config.json`.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_dir().join("config.json"))
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run `terminctl init` to create one.",
                path.display()
            );
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let dir = config_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn create_default_at(path: &std::path::Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        let config = Self {
            providers: ProvidersConfig {
                primary: ProviderConfig {
                    model: "gpt-4o".to_string(),
                    base_url: "https://api.openai.com/v1".to_string(),
                    api_key: "your-primary-api-key-here".to_string(),
                },
                fallback: ProviderConfig {
                    model: "glm-4-flash".to_string(),
                    base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
                    api_key: "your-fallback-api-key-here".to_string(),
                },
                reflection: None,
            },
            database: default_database_config(),
            memory: default_memory_config(),
            reflection: default_reflection_config(),
            calendars: default_calendars_config(),
            extraction: default_extraction_config(),
            family: FamilyConfig {
                user_name: "Alex".to_string(),
                partner_name: "Sam".to_string(),
                children_names: vec![],
            },
            timezone: default_timezone(),
            profiles_dir: default_profiles_dir(),
        };
        let content = serde_json::to_string_pretty(&config)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        Config::create_default_at(&path).expect("create default");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.family.user_name, "Alex");
        assert!((loaded.extraction.confidence_auto_threshold - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_file_errors_clearly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.json");
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("init"));
    }

    #[test]
    fn defaults_apply_when_sections_omitted() {
        let minimal = serde_json::json!({
            "providers": {
                "primary": {"model": "m", "base_url": "http://x", "api_key": "k"},
                "fallback": {"model": "m2", "base_url": "http://y", "api_key": "k2"},
            },
            "family": {"user_name": "A", "partner_name": "B"},
        });
        let config: Config = serde_json::from_value(minimal).expect("deserialize");
        assert_eq!(config.extraction.max_existing, 30);
        assert_eq!(config.reflection.interval_min, 30);
        assert_eq!(config.timezone, "Europe/Berlin");
    }
}
