//! Unit tests for the Prometheus registry

use stratlab::metrics::Metrics;

#[test]
fn test_export_lists_registered_metrics() {
    let metrics = Metrics::new().expect("metrics initialization");
    metrics.simulations_total.inc();
    metrics.cache_hits_total.inc_by(3);

    let body = metrics.export().unwrap();
    for name in [
        "http_requests_total",
        "simulations_total 1",
        "simulation_duration_seconds",
        "cache_hits_total 3",
        "notifications_published_total",
        "database_connected",
    ] {
        assert!(body.contains(name), "missing {} in export", name);
    }
}

#[test]
fn test_registries_are_independent() {
    let a = Metrics::new().unwrap();
    let b = Metrics::new().unwrap();
    a.simulations_total.inc();
    assert_eq!(b.simulations_total.get(), 0);
}
