//! pagewarden.toml 통합 설정 테스트
//!
//! - pagewarden.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use pagewarden_core::config::PagewardenConfig;
use pagewarden_core::error::{ConfigError, PagewardenError};

// =============================================================================
// pagewarden.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../pagewarden.toml.example");
    let config = PagewardenConfig::parse(content).expect("example config should parse");

    // general 기본값 확인
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.general.pid_file, "/var/run/pagewarden/pagewarden.pid");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../pagewarden.toml.example");
    let config = PagewardenConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_has_correct_guard_defaults() {
    let content = include_str!("../../../pagewarden.toml.example");
    let config = PagewardenConfig::parse(content).expect("should parse");

    assert!(!config.guard.enabled);
    assert_eq!(config.guard.check_interval_secs, 300);
    assert_eq!(config.guard.max_concurrent_checks, 8);
    assert!((config.guard.confidence_threshold - 0.8).abs() < f64::EPSILON);
    assert_eq!(config.guard.max_fix_attempts, 3);
    assert!(!config.guard.auto_fix);
}

#[test]
fn example_config_has_correct_platform_defaults() {
    let content = include_str!("../../../pagewarden.toml.example");
    let config = PagewardenConfig::parse(content).expect("should parse");

    assert_eq!(config.platform.api_base, "https://graph.facebook.com/v23.0");
    assert_eq!(config.platform.request_timeout_secs, 30);
}

#[test]
fn example_config_has_correct_content_defaults() {
    let content = include_str!("../../../pagewarden.toml.example");
    let config = PagewardenConfig::parse(content).expect("should parse");

    assert_eq!(config.content.api_base, "https://api.openai.com/v1");
    assert_eq!(config.content.model, "gpt-4o-mini");
    assert_eq!(config.content.api_key_env, "PAGEWARDEN_CONTENT_API_KEY");
    assert_eq!(config.content.max_suggestions, 3);
}

#[test]
fn example_config_has_correct_metrics_defaults() {
    let content = include_str!("../../../pagewarden.toml.example");
    let config = PagewardenConfig::parse(content).expect("should parse");

    assert!(!config.metrics.enabled);
    assert_eq!(config.metrics.listen_addr, "127.0.0.1");
    assert_eq!(config.metrics.port, 9600);
    assert_eq!(config.metrics.endpoint, "/metrics");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../pagewarden.toml.example");
    let from_file = PagewardenConfig::parse(content).expect("should parse");
    let from_code = PagewardenConfig::default();

    // 모든 기본값이 코드 Default 구현과 일치하는지 확인
    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);
    assert_eq!(from_file.general.pid_file, from_code.general.pid_file);

    assert_eq!(from_file.guard.enabled, from_code.guard.enabled);
    assert_eq!(
        from_file.guard.check_interval_secs,
        from_code.guard.check_interval_secs
    );
    assert_eq!(
        from_file.guard.max_concurrent_checks,
        from_code.guard.max_concurrent_checks
    );
    assert_eq!(
        from_file.guard.max_fix_attempts,
        from_code.guard.max_fix_attempts
    );

    assert_eq!(from_file.platform.api_base, from_code.platform.api_base);
    assert_eq!(from_file.content.api_base, from_code.content.api_base);
    assert_eq!(from_file.content.model, from_code.content.model);
    assert_eq!(from_file.metrics.port, from_code.metrics.port);
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_only_guard_section() {
    let toml = r#"
[guard]
enabled = true
check_interval_secs = 120
"#;
    let config = PagewardenConfig::parse(toml).expect("should parse");
    assert!(config.guard.enabled);
    assert_eq!(config.guard.check_interval_secs, 120);
    // 나머지 섹션은 기본값
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.content.model, "gpt-4o-mini");
}

#[test]
fn empty_config_uses_all_defaults() {
    let config = PagewardenConfig::parse("").expect("empty config should parse");
    config.validate().expect("defaults should validate");
    assert!(!config.guard.enabled);
    assert!(config.pages.is_empty());
}

#[test]
fn unknown_section_is_rejected_or_ignored() {
    // toml 크레이트는 기본적으로 unknown field를 무시하지 않지만
    // 최상위 구조체는 deny_unknown_fields를 쓰지 않으므로 통과해야 함
    let toml = r#"
[general]
log_level = "warn"

[future_section]
key = "value"
"#;
    let config = PagewardenConfig::parse(toml).expect("unknown sections are ignored");
    assert_eq!(config.general.log_level, "warn");
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_wins_over_file_value() {
    let toml = r#"
[guard]
check_interval_secs = 120
"#;
    unsafe {
        std::env::set_var("PAGEWARDEN_GUARD_CHECK_INTERVAL_SECS", "900");
    }
    let mut config = PagewardenConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    unsafe {
        std::env::remove_var("PAGEWARDEN_GUARD_CHECK_INTERVAL_SECS");
    }
    assert_eq!(config.guard.check_interval_secs, 900);
}

#[test]
#[serial_test::serial]
fn env_override_applies_to_metrics() {
    unsafe {
        std::env::set_var("PAGEWARDEN_METRICS_ENABLED", "true");
        std::env::set_var("PAGEWARDEN_METRICS_PORT", "9700");
    }
    let mut config = PagewardenConfig::default();
    config.apply_env_overrides();
    unsafe {
        std::env::remove_var("PAGEWARDEN_METRICS_ENABLED");
        std::env::remove_var("PAGEWARDEN_METRICS_PORT");
    }
    assert!(config.metrics.enabled);
    assert_eq!(config.metrics.port, 9700);
}

// =============================================================================
// 파일 로딩 에러 테스트
// =============================================================================

#[tokio::test]
async fn load_missing_file_returns_file_not_found() {
    let result = PagewardenConfig::from_file("/nonexistent/pagewarden.toml").await;
    assert!(matches!(
        result,
        Err(PagewardenError::Config(ConfigError::FileNotFound { .. }))
    ));
}

#[tokio::test]
async fn load_invalid_file_returns_parse_error() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    writeln!(file, "not [valid toml").expect("write temp file");

    let result = PagewardenConfig::from_file(file.path()).await;
    assert!(matches!(
        result,
        Err(PagewardenError::Config(ConfigError::ParseFailed { .. }))
    ));
}

#[tokio::test]
async fn load_valid_file_roundtrip() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    writeln!(
        file,
        r#"
[general]
log_level = "debug"

[guard]
enabled = true
check_interval_secs = 60

[[pages]]
id = "page-1"
name = "Acme Coffee"
access_token = "tok"
"#
    )
    .expect("write temp file");

    let config = PagewardenConfig::from_file(file.path())
        .await
        .expect("should load");
    assert_eq!(config.general.log_level, "debug");
    assert!(config.guard.enabled);
    assert_eq!(config.pages.len(), 1);
}
