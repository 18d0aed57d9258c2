//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use medha_core::FlowContext;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Client handles every flow runs against.
    pub flows: FlowContext,
}

impl AppState {
    pub fn new(flows: FlowContext) -> Self {
        Self { flows }
    }
}
