//! Job context for dependency injection

use crate::cache::StrategyCache;
use crate::db::StrategyRepository;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Context passed to job handlers via the Apalis `Data<T>` pattern
pub struct JobContext {
    pub strategies: Arc<dyn StrategyRepository>,
    pub cache: Arc<dyn StrategyCache>,
    pub metrics: Option<Arc<Metrics>>,
}

impl JobContext {
    pub fn new(
        strategies: Arc<dyn StrategyRepository>,
        cache: Arc<dyn StrategyCache>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            strategies,
            cache,
            metrics,
        }
    }
}
