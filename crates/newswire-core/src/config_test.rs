use std::collections::HashMap;
use std::env::VarError;
use std::time::Duration;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(parse_environment("development"), Environment::Development);
    assert_eq!(parse_environment("test"), Environment::Test);
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn empty_env_produces_defaults() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should parse");

    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.sources_path.is_none());
    assert_eq!(cfg.user_agent, "newswire/0.1 (feed-aggregator)");
    assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
    assert_eq!(cfg.fetch_max_concurrent, 8);
    assert!(cfg.fallback_enabled);
    assert_eq!(cfg.fallback_count, 3);
    assert_eq!(cfg.default_limit, 10);
    assert_eq!(cfg.aggregate_deadline, Some(Duration::from_secs(30)));
    assert_eq!(cfg.schedule_interval, Duration::from_secs(600));
    assert_eq!(cfg.crawl_queue_capacity, 32);
    assert!(cfg.ai.api_key.is_none());
    assert_eq!(cfg.ai.base_url, "https://api.openai.com/v1");
    assert_eq!(cfg.ai.model, "gpt-4o-mini");
    assert_eq!(cfg.ai.max_attempts, 3);
    assert_eq!(cfg.ai.retry_delay, Duration::from_secs(2));
}

#[test]
fn blank_api_key_is_treated_as_unconfigured() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.ai.api_key.is_none());
}

#[test]
fn api_key_is_redacted_in_debug_output() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-secret-value");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.ai.api_key.as_deref(), Some("sk-secret-value"));
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("sk-secret-value"), "leaked key: {rendered}");
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn fallback_flag_accepts_common_spellings() {
    for (raw, expected) in [("false", false), ("0", false), ("no", false), ("YES", true)] {
        let mut map = HashMap::new();
        map.insert("NEWSWIRE_FALLBACK_ENABLED", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.fallback_enabled, expected, "input {raw}");
    }
}

#[test]
fn fallback_flag_rejects_garbage() {
    let mut map = HashMap::new();
    map.insert("NEWSWIRE_FALLBACK_ENABLED", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSWIRE_FALLBACK_ENABLED"),
        "expected InvalidEnvVar(NEWSWIRE_FALLBACK_ENABLED), got: {result:?}"
    );
}

#[test]
fn invalid_fetch_timeout_is_rejected() {
    let mut map = HashMap::new();
    map.insert("NEWSWIRE_FETCH_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSWIRE_FETCH_TIMEOUT_SECS"),
        "expected InvalidEnvVar(NEWSWIRE_FETCH_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn zero_fetch_timeout_is_rejected() {
    let mut map = HashMap::new();
    map.insert("NEWSWIRE_FETCH_TIMEOUT_SECS", "0");
    assert!(build_app_config(lookup_from_map(&map)).is_err());
}

#[test]
fn zero_ai_timeout_is_rejected() {
    let mut map = HashMap::new();
    map.insert("NEWSWIRE_AI_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSWIRE_AI_TIMEOUT_SECS"),
        "expected InvalidEnvVar(NEWSWIRE_AI_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn zero_deadline_disables_aggregate_deadline() {
    let mut map = HashMap::new();
    map.insert("NEWSWIRE_AGGREGATE_DEADLINE_SECS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.aggregate_deadline.is_none());
}

#[test]
fn zero_concurrency_and_attempts_are_clamped_to_one() {
    let mut map = HashMap::new();
    map.insert("NEWSWIRE_FETCH_MAX_CONCURRENT", "0");
    map.insert("NEWSWIRE_AI_MAX_ATTEMPTS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.fetch_max_concurrent, 1);
    assert_eq!(cfg.ai.max_attempts, 1);
}

#[test]
fn sources_path_override_is_read() {
    let mut map = HashMap::new();
    map.insert("NEWSWIRE_SOURCES_PATH", "./config/sources.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.sources_path.as_deref(),
        Some(std::path::Path::new("./config/sources.yaml"))
    );
}
