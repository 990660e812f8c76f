//! HTTP API for the reaction service
//!
//! The host's adapter posts lifecycle notifications here.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::controller::LifecycleController;
use crate::gateway::ReactionGateway;
use std::sync::Arc;

/// Controller type used by the service: the gateway is chosen at startup
pub type SharedController = LifecycleController<Arc<dyn ReactionGateway>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SharedController>,
}

impl AppState {
    pub fn new(controller: Arc<SharedController>) -> Self {
        Self { controller }
    }
}
