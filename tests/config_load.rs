// tests/config_load.rs
// Run single-threaded sections via serial_test because we mutate process env / CWD.

use std::{env, fs};

use trend_pulse::config::ai::AiConfig;
use trend_pulse::config::{load_config_default, load_config_from};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("dashboard.toml");
    fs::write(
        &p_toml,
        r#"
feed_url = "https://trends.google.com/trending/rss?geo=GB"
enrich_delay_ms = 1500

[options]
include_oldest_post_date = false
"#,
    )
    .unwrap();
    let c = load_config_from(&p_toml).unwrap();
    assert_eq!(c.feed_url, "https://trends.google.com/trending/rss?geo=GB");
    assert_eq!(c.enrich_delay_ms, 1500);
    assert!(!c.options.include_oldest_post_date);
    assert!(c.options.include_summary_generation);

    let p_json = dir.path().join("dashboard.json");
    fs::write(&p_json, r#"{"refresh_interval_secs": 30, "http_retries": 2}"#).unwrap();
    let cj = load_config_from(&p_json).unwrap();
    assert_eq!(cj.refresh_interval_secs, 30);
    assert_eq!(cj.http_retries, 2);
    assert_eq!(cj.enrich_delay_ms, 1000);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var("DASHBOARD_CONFIG_PATH");
    env::remove_var("TRENDS_FEED_URL");
    env::remove_var("TRENDS_PROXY_URL");
    env::remove_var("TRENDS_REFRESH_SECS");

    // 1) Nothing -> defaults
    let c = load_config_default().unwrap();
    assert_eq!(c.refresh_interval_secs, 60);
    assert_eq!(c.enrich_delay_ms, 1000);

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("dashboard.toml"), "refresh_interval_secs = 90").unwrap();
    assert_eq!(load_config_default().unwrap().refresh_interval_secs, 90);

    // 3) Explicit path wins over fallback
    let p_env = tmp.path().join("explicit.json");
    fs::write(&p_env, r#"{"refresh_interval_secs": 15}"#).unwrap();
    env::set_var("DASHBOARD_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().refresh_interval_secs, 15);

    // 4) Env overrides win over files
    env::set_var("TRENDS_REFRESH_SECS", "120");
    env::set_var("TRENDS_FEED_URL", "http://localhost/feed.xml");
    let c = load_config_default().unwrap();
    assert_eq!(c.refresh_interval_secs, 120);
    assert_eq!(c.feed_url, "http://localhost/feed.xml");

    // 5) Missing explicit path is an error
    env::set_var("DASHBOARD_CONFIG_PATH", tmp.path().join("nope.toml").display().to_string());
    assert!(load_config_default().is_err());

    env::remove_var("DASHBOARD_CONFIG_PATH");
    env::remove_var("TRENDS_REFRESH_SECS");
    env::remove_var("TRENDS_FEED_URL");
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn ai_config_resolves_env_key_and_fails_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("ai.json");
    fs::write(&p, r#"{"enabled": true, "provider": "OpenAI", "api_key": "ENV"}"#).unwrap();

    env::set_var("OPENAI_API_KEY", "sk-test");
    let cfg = AiConfig::load_from_file(&p).unwrap();
    assert_eq!(cfg.provider, "openai");
    assert_eq!(cfg.model, "gpt-3.5-turbo");
    assert_eq!(cfg.api_key, "sk-test");

    env::remove_var("OPENAI_API_KEY");
    assert!(AiConfig::load_from_file(&p).is_err(), "missing key must fail at load");

    fs::write(&p, r#"{"provider": "claude", "api_key": "k"}"#).unwrap();
    assert!(AiConfig::load_from_file(&p).is_err());
}

#[serial_test::serial]
#[test]
fn ai_default_without_file_or_key_is_none() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var("OPENAI_API_KEY");
    assert!(AiConfig::load_default().unwrap().is_none());

    env::set_var("OPENAI_API_KEY", "sk-from-env");
    let cfg = AiConfig::load_default().unwrap().expect("configured from env");
    assert_eq!(cfg.api_key, "sk-from-env");
    env::remove_var("OPENAI_API_KEY");

    env::set_current_dir(&old).unwrap();
}
