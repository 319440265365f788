//! Application state management.

use crate::config::AppConfig;
use crate::session::SessionStore;
use spread_engine::ComparisonOrchestrator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers and background tasks.
pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: ComparisonOrchestrator,
    pub sessions: SessionStore,
    /// Running flag.
    pub running: AtomicBool,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, orchestrator: ComparisonOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
            sessions: SessionStore::new(),
            running: AtomicBool::new(false),
            started_at: Instant::now(),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

/// Create shared state.
pub fn create_state(config: AppConfig, orchestrator: ComparisonOrchestrator) -> SharedState {
    Arc::new(AppState::new(config, orchestrator))
}
