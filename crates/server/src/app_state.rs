use std::sync::Arc;

use arbiter::ControlSurface;
use shared::protocol::ServerEvent;
use tokio::sync::{broadcast, Mutex};

/// One lock covers the arbiter, its workers and the PV store, so each
/// request is applied to completion before the next.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) surface: Arc<Mutex<ControlSurface>>,
    pub(crate) events: broadcast::Sender<ServerEvent>,
}

impl AppState {
    pub(crate) fn new(surface: ControlSurface, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            surface: Arc::new(Mutex::new(surface)),
            events,
        }
    }
}
