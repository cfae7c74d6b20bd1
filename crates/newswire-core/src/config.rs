use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::{AiSettings, AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config with AI disabled.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("NEWSWIRE_ENV", "development"));
    let log_level = or_default("NEWSWIRE_LOG_LEVEL", "info");
    let sources_path = lookup("NEWSWIRE_SOURCES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let user_agent = or_default("NEWSWIRE_USER_AGENT", "newswire/0.1 (feed-aggregator)");

    let fetch_timeout_secs = parse_u64("NEWSWIRE_FETCH_TIMEOUT_SECS", "10")?;
    if fetch_timeout_secs == 0 {
        return Err(invalid(
            "NEWSWIRE_FETCH_TIMEOUT_SECS",
            "fetch timeout must be at least 1 second".to_string(),
        ));
    }
    let fetch_max_concurrent = parse_usize("NEWSWIRE_FETCH_MAX_CONCURRENT", "8")?.max(1);
    let fallback_enabled = parse_bool("NEWSWIRE_FALLBACK_ENABLED", "true")?;
    let fallback_count = parse_usize("NEWSWIRE_FALLBACK_COUNT", "3")?;
    let default_limit = parse_usize("NEWSWIRE_DEFAULT_LIMIT", "10")?.max(1);

    // 0 disables the caller-side deadline; per-fetch timeouts still apply.
    let deadline_secs = parse_u64("NEWSWIRE_AGGREGATE_DEADLINE_SECS", "30")?;
    let aggregate_deadline = (deadline_secs > 0).then_some(Duration::from_secs(deadline_secs));

    let interval_secs = parse_u64("NEWSWIRE_SCHEDULE_INTERVAL_SECS", "600")?;
    if interval_secs == 0 {
        return Err(invalid(
            "NEWSWIRE_SCHEDULE_INTERVAL_SECS",
            "schedule interval must be at least 1 second".to_string(),
        ));
    }
    let crawl_queue_capacity = parse_usize("NEWSWIRE_CRAWL_QUEUE_CAPACITY", "32")?.max(1);

    let ai_timeout_secs = parse_u64("NEWSWIRE_AI_TIMEOUT_SECS", "30")?;
    if ai_timeout_secs == 0 {
        return Err(invalid(
            "NEWSWIRE_AI_TIMEOUT_SECS",
            "AI request timeout must be at least 1 second".to_string(),
        ));
    }

    let api_key = lookup("OPENAI_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    let ai = AiSettings {
        api_key,
        base_url: or_default("NEWSWIRE_AI_BASE_URL", "https://api.openai.com/v1"),
        model: or_default("NEWSWIRE_AI_MODEL", "gpt-4o-mini"),
        max_attempts: parse_u32("NEWSWIRE_AI_MAX_ATTEMPTS", "3")?.max(1),
        retry_delay: Duration::from_secs(parse_u64("NEWSWIRE_AI_RETRY_DELAY_SECS", "2")?),
        request_timeout: Duration::from_secs(ai_timeout_secs),
    };

    Ok(AppConfig {
        env,
        log_level,
        sources_path,
        user_agent,
        fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        fetch_max_concurrent,
        fallback_enabled,
        fallback_count,
        default_limit,
        aggregate_deadline,
        schedule_interval: Duration::from_secs(interval_secs),
        crawl_queue_capacity,
        ai,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
