//! Unit tests for the notification runtime

use stratlab::core::runtime::RuntimeConfig;

#[test]
fn test_runtime_config_default() {
    let config = RuntimeConfig::default();
    assert_eq!(config.concurrency, 1);
}

// NotificationRuntime::new() needs a live Redis storage; the event handler
// itself is covered in jobs_handlers.
