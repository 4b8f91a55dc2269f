//! Prometheus metrics for the API server and worker

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub simulations_total: IntCounter,
    pub simulation_duration_seconds: Histogram,
    pub simulation_rows_skipped_total: IntCounter,
    pub cache_hits_total: IntCounter,
    pub cache_misses_total: IntCounter,
    pub notifications_published_total: IntCounter,
    pub notifications_processed_total: IntCounter,
    pub database_connected: Gauge,
    pub cache_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let simulations_total =
            IntCounter::new("simulations_total", "Completed strategy simulations")?;
        let simulation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "simulation_duration_seconds",
                "Time spent replaying a historical series",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        let simulation_rows_skipped_total = IntCounter::new(
            "simulation_rows_skipped_total",
            "Malformed historical rows dropped during simulation",
        )?;
        let cache_hits_total =
            IntCounter::new("cache_hits_total", "Strategy list cache hits")?;
        let cache_misses_total =
            IntCounter::new("cache_misses_total", "Strategy list cache misses")?;
        let notifications_published_total = IntCounter::new(
            "notifications_published_total",
            "Strategy update notifications published",
        )?;
        let notifications_processed_total = IntCounter::new(
            "notifications_processed_total",
            "Strategy update notifications consumed by the worker",
        )?;
        let database_connected =
            Gauge::new("database_connected", "1 when the database connection is up")?;
        let cache_connected = Gauge::new("cache_connected", "1 when the Redis cache is up")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(simulations_total.clone()))?;
        registry.register(Box::new(simulation_duration_seconds.clone()))?;
        registry.register(Box::new(simulation_rows_skipped_total.clone()))?;
        registry.register(Box::new(cache_hits_total.clone()))?;
        registry.register(Box::new(cache_misses_total.clone()))?;
        registry.register(Box::new(notifications_published_total.clone()))?;
        registry.register(Box::new(notifications_processed_total.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;
        registry.register(Box::new(cache_connected.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            simulations_total,
            simulation_duration_seconds,
            simulation_rows_skipped_total,
            cache_hits_total,
            cache_misses_total,
            notifications_published_total,
            notifications_processed_total,
            database_connected,
            cache_connected,
        })
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn export(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
