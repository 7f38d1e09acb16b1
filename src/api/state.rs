//! Application State
//!
//! Shared state accessible by all API handlers, wrapped in `Arc`.

use crate::config::ApiConfig;
use crate::service::Service;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub service: Service,
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Service, config: ApiConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
