//! Shared application state.

use crate::config::Config;
use n8n_core::{ExecutionStorage, MemoryExecutionStorage, MemoryWorkflowStorage, WorkflowEngine, WorkflowStorage};
use std::sync::Arc;

/// Shared application state threaded through every handler via `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<WorkflowEngine>,
    pub workflow_storage: Arc<dyn WorkflowStorage>,
    pub execution_storage: Arc<dyn ExecutionStorage>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let runtime_config = n8n_core::RuntimeConfig::default();

        Self {
            config: Arc::new(config),
            engine: Arc::new(WorkflowEngine::new(runtime_config)),
            workflow_storage: Arc::new(MemoryWorkflowStorage::new()),
            execution_storage: Arc::new(MemoryExecutionStorage::new()),
        }
    }
}
