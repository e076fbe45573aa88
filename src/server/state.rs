//! Server state management

use std::sync::Arc;

use crate::config::MockConfig;
use crate::engine::MockEngine;
use crate::error::MockResult;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MockEngine>,
    pub config: Arc<MockConfig>,
}

impl AppState {
    pub fn new(config: MockConfig) -> MockResult<Self> {
        Ok(Self {
            engine: Arc::new(MockEngine::new(&config)?),
            config: Arc::new(config),
        })
    }
}
