//! Application state for the web layer.

use crate::service::Dispatcher;

/// Shared application state.
///
/// Every request goes through the scheduler actor's handle.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}
