//! Server state: the engine instance and its pending events

use crate::engine::{EventQueue, MapEngine, MapEvent};
use crate::server::backend::StreamingBackend;

pub struct ServerState {
    /// Created by `Init`; `None` before that
    pub engine: Option<MapEngine<StreamingBackend>>,
    /// Shared with the engine's listener slot
    pub events: EventQueue,
    /// Last GeoJSON file loaded through `LoadGeoJson`
    pub source_path: Option<String>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            engine: None,
            events: EventQueue::new(),
            source_path: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Events produced since the last call, oldest first
    pub fn take_events(&self) -> Vec<MapEvent> {
        self.events.drain()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
