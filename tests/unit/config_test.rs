//! Tests for configuration validation and loading

use sage_jobs::config::{SchedulerConfig, DEFAULT_THREAD_NAME_PREFIX, MIN_THREAD_STACK_SIZE};
use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let cfg = SchedulerConfig::default();
    assert_eq!(cfg.worker_count, 0);
    assert_eq!(cfg.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);
    assert!(cfg.thread_stack_size.is_none());
    assert!(cfg.validate().is_ok());
    assert!(cfg.resolved_worker_count() >= 1);
}

#[test]
fn test_builder_setters() {
    let cfg = SchedulerConfig::new()
        .with_worker_count(6)
        .with_thread_name_prefix("render")
        .with_thread_stack_size(MIN_THREAD_STACK_SIZE * 4);
    assert_eq!(cfg.resolved_worker_count(), 6);
    assert_eq!(cfg.thread_name_prefix, "render");
    assert_eq!(cfg.thread_stack_size, Some(MIN_THREAD_STACK_SIZE * 4));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_invalid_prefix() {
    let cfg = SchedulerConfig::new().with_thread_name_prefix("   ");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_stack_size() {
    let cfg = SchedulerConfig::new().with_thread_stack_size(1024);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("thread_stack_size"));
}

#[test]
fn test_from_json_partial() {
    let cfg = SchedulerConfig::from_json_str(r#"{ "worker_count": 3 }"#).unwrap();
    assert_eq!(cfg.worker_count, 3);
    assert_eq!(cfg.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);
}

#[test]
fn test_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str("{ not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{ "thread_stack_size": 16 }"#).is_err());
}

#[test]
fn test_json_roundtrip() {
    let cfg = SchedulerConfig::new().with_worker_count(2).with_thread_name_prefix("io");
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(SchedulerConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_from_lookup() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        ("SAGE_JOBS_WORKER_COUNT", "5"),
        ("SAGE_JOBS_THREAD_PREFIX", "audio"),
        ("SAGE_JOBS_STACK_SIZE", "1048576"),
    ]))
    .unwrap();
    assert_eq!(cfg.worker_count, 5);
    assert_eq!(cfg.thread_name_prefix, "audio");
    assert_eq!(cfg.thread_stack_size, Some(1_048_576));
}

#[test]
fn test_from_lookup_empty_keeps_defaults() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, SchedulerConfig::default());
}

#[test]
fn test_from_lookup_rejects_garbage() {
    let err =
        SchedulerConfig::from_lookup(lookup(&[("SAGE_JOBS_WORKER_COUNT", "many")])).unwrap_err();
    assert!(err.contains("SAGE_JOBS_WORKER_COUNT"));
}
