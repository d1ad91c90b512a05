//! Shared handler state

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use operator_core::api::{ApprovalService, ChatGateway, IntentClassifier};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub session_id: String,
    pub gateway: Arc<ChatGateway>,
    pub approvals: ApprovalService,
    pub classifier: Arc<dyn IntentClassifier>,
    pub stats: Arc<RwLock<ServerStats>>,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        session_id: String,
        gateway: ChatGateway,
        approvals: ApprovalService,
        classifier: Arc<dyn IntentClassifier>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            session_id,
            gateway: Arc::new(gateway),
            approvals,
            classifier,
            stats: Arc::new(RwLock::new(ServerStats::new())),
            shutdown_tx,
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        if let Ok(mut stats) = self.stats.write() {
            stats.increment_request(endpoint);
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.increment_error();
        }
    }
}

#[derive(Debug)]
pub struct ServerStats {
    started_at: Instant,
    pub requests_total: u64,
    pub errors_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_total: 0,
            errors_total: 0,
            requests_by_endpoint: HashMap::new(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
