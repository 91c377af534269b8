//! Job configuration loaded from environment variables.
//!
//! A `.env` file is honored for local runs. Credentials are ready-to-use
//! tokens; minting them is left to the environment that runs the job.

use chrono::{Duration, FixedOffset};
use std::env;
use std::ops::RangeInclusive;

/// Largest accepted match tolerance: one leap year.
pub const MAX_TOLERANCE_MINUTES: i64 = 366 * 24 * 60;
/// Largest accepted lookback (and window) in windowed mode.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// How activities are paged out of Garmin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Offset + limit pages, newest first.
    Paged,
    /// Date-range windows walking backwards from today.
    Windowed,
}

/// Whether category and title must agree before a candidate is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Strict,
    Lenient,
}

/// Which label table is applied before values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelLocale {
    English,
    Japanese,
}

/// Tuning parameters for fetching and reconciliation.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub fetch_mode: FetchMode,
    /// Maximum activities pulled in paged mode
    pub fetch_limit: usize,
    /// Page size in paged mode
    pub chunk_size: usize,
    /// Days covered in windowed mode
    pub lookback_days: i64,
    /// Width of one request window in windowed mode
    pub window_days: i64,
    pub tolerance: Duration,
    pub match_mode: MatchMode,
    /// Timezone every timestamp is normalized to
    pub reference_offset: FixedOffset,
    pub label_locale: LabelLocale,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            fetch_mode: FetchMode::Paged,
            fetch_limit: 1000,
            chunk_size: 100,
            lookback_days: 60,
            window_days: 7,
            tolerance: Duration::hours(48),
            match_mode: MatchMode::Lenient,
            reference_offset: jst(),
            label_locale: LabelLocale::Japanese,
        }
    }
}

/// Job configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub garmin_base_url: String,
    pub garmin_access_token: Option<String>,
    pub notion_token: String,
    /// Activity database
    pub notion_db_id: Option<String>,
    pub notion_daily_db_id: Option<String>,
    pub notion_report_db_id: Option<String>,
    /// Page the databases are created under by `init-databases`
    pub notion_parent_page_id: Option<String>,
    pub google_access_token: Option<String>,
    pub google_drive_folder_id: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub settings: SyncSettings,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let defaults = SyncSettings::default();
        let settings = SyncSettings {
            fetch_mode: match get("FETCH_MODE").as_deref() {
                None | Some("paged") => FetchMode::Paged,
                Some("windowed") => FetchMode::Windowed,
                Some(other) => return Err(ConfigError::invalid("FETCH_MODE", other)),
            },
            fetch_limit: parse_or("GARMIN_ACTIVITIES_FETCH_LIMIT", get, defaults.fetch_limit)?,
            chunk_size: parse_or("FETCH_CHUNK_SIZE", get, defaults.chunk_size)?,
            lookback_days: parse_within(
                "LOOKBACK_DAYS",
                get,
                defaults.lookback_days,
                0..=MAX_LOOKBACK_DAYS,
            )?,
            window_days: parse_within(
                "WINDOW_DAYS",
                get,
                defaults.window_days,
                1..=MAX_LOOKBACK_DAYS,
            )?,
            tolerance: {
                let minutes = parse_within(
                    "MATCH_TOLERANCE_MINUTES",
                    get,
                    defaults.tolerance.num_minutes(),
                    0..=MAX_TOLERANCE_MINUTES,
                )?;
                Duration::try_minutes(minutes).ok_or_else(|| {
                    ConfigError::invalid("MATCH_TOLERANCE_MINUTES", &minutes.to_string())
                })?
            },
            match_mode: match get("MATCH_MODE").as_deref() {
                None | Some("lenient") => MatchMode::Lenient,
                Some("strict") => MatchMode::Strict,
                Some(other) => return Err(ConfigError::invalid("MATCH_MODE", other)),
            },
            reference_offset: match get("REFERENCE_UTC_OFFSET") {
                None => defaults.reference_offset,
                Some(raw) => raw
                    .parse::<FixedOffset>()
                    .map_err(|_| ConfigError::invalid("REFERENCE_UTC_OFFSET", &raw))?,
            },
            label_locale: match get("LABEL_LOCALE").as_deref() {
                None | Some("ja") => LabelLocale::Japanese,
                Some("en") => LabelLocale::English,
                Some(other) => return Err(ConfigError::invalid("LABEL_LOCALE", other)),
            },
        };

        if settings.chunk_size == 0 {
            return Err(ConfigError::invalid("FETCH_CHUNK_SIZE", "0"));
        }

        Ok(Self {
            garmin_base_url: get("GARMIN_BASE_URL")
                .unwrap_or_else(|| "https://connectapi.garmin.com".to_string()),
            garmin_access_token: get("GARMIN_ACCESS_TOKEN"),
            notion_token: required("NOTION_TOKEN")?,
            notion_db_id: get("NOTION_DB_ID"),
            notion_daily_db_id: get("NOTION_DAILY_DB_ID"),
            notion_report_db_id: get("NOTION_REPORT_DB_ID"),
            notion_parent_page_id: get("NOTION_PARENT_PAGE_ID"),
            google_access_token: get("GOOGLE_ACCESS_TOKEN"),
            google_drive_folder_id: get("GOOGLE_DRIVE_FOLDER_ID"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-pro".to_string()),
            settings,
        })
    }

    /// Return an optional value, or fail with the variable it comes from.
    pub fn require<'a>(
        value: &'a Option<String>,
        name: &'static str,
    ) -> Result<&'a str, ConfigError> {
        value.as_deref().ok_or(ConfigError::Missing(name))
    }
}

/// Parse an integer variable and reject values outside `range`.
fn parse_within<G>(
    key: &'static str,
    get: G,
    default: i64,
    range: RangeInclusive<i64>,
) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(key, get, default)?;
    if !range.contains(&value) {
        return Err(ConfigError::invalid(key, &value.to_string()));
    }
    Ok(value)
}

fn parse_or<T, G>(key: &'static str, get: G, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::invalid(key, &raw)),
    }
}

/// Japan Standard Time, the zone the destination databases are kept in.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("+09:00 is a valid offset")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
        }
    }
}
