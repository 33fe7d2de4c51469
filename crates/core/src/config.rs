use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub tables: TablesConfig,
    pub analytics: AnalyticsConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CALLSCOPE_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CALLSCOPE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            tables: TablesConfig::from_env_profiled(p),
            analytics: AnalyticsConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  tables:     country={}, city={}, strict={}",
            self.tables.country_path().display(),
            self.tables.city_path().display(),
            self.tables.strict
        );
        tracing::info!("  analytics:  workers={}", self.analytics.workers);
    }
}

// ── Reference tables ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    pub dir: PathBuf,
    pub country_file: String,
    pub city_file: String,
    /// Missing tables abort aggregation instead of leaving geography empty.
    pub strict: bool,
}

impl TablesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: PathBuf::from(profiled_env_or(p, "CALLSCOPE_TABLES_DIR", "data/tables")),
            country_file: profiled_env_or(p, "CALLSCOPE_COUNTRY_TABLE", "country_codes.json"),
            city_file: profiled_env_or(p, "CALLSCOPE_CITY_TABLE", "city_codes.json"),
            strict: profiled_env_bool(p, "CALLSCOPE_STRICT_TABLES", false),
        }
    }

    pub fn country_path(&self) -> PathBuf {
        self.dir.join(&self.country_file)
    }

    pub fn city_path(&self) -> PathBuf {
        self.dir.join(&self.city_file)
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/tables"),
            country_file: "country_codes.json".to_string(),
            city_file: "city_codes.json".to_string(),
            strict: false,
        }
    }
}

// ── Analytics ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Worker threads for batch evaluation (0 = rayon default).
    pub workers: usize,
}

impl AnalyticsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            workers: profiled_env_usize(p, "CALLSCOPE_WORKERS", 0),
        }
    }
}
