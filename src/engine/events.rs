//! Events emitted by the map engine

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::Serialize;

/// Something the surrounding application may want to react to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MapEvent {
    /// Backend initialized and first frame submitted
    Load,
    /// Camera zoom or center changed
    Move,
    Click {
        #[serde(rename = "lngLat")]
        lng_lat: [f64; 2],
        point: [f64; 2],
    },
    /// Pointer moved while not dragging
    MouseMove {
        #[serde(rename = "lngLat")]
        lng_lat: [f64; 2],
        point: [f64; 2],
    },
    MouseLeave,
    /// Rendering is not possible; the engine keeps running without drawing
    Unavailable { reason: String },
}

/// Receiver of map events
pub trait MapListener {
    fn on_event(&mut self, event: &MapEvent);
}

impl<F: FnMut(&MapEvent)> MapListener for F {
    fn on_event(&mut self, event: &MapEvent) {
        self(event)
    }
}

/// Listener that records events for later draining
///
/// Clones share one queue, so a host can hand one clone to the engine and
/// drain the other after each call.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Rc<RefCell<VecDeque<MapEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued event, oldest first
    pub fn drain(&self) -> Vec<MapEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl MapListener for EventQueue {
    fn on_event(&mut self, event: &MapEvent) {
        self.events.borrow_mut().push_back(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = MapEvent::Click {
            lng_lat: [139.7, 35.7],
            point: [10.0, 20.0],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "click");
        assert_eq!(json["lngLat"][0], 139.7);
        assert_eq!(serde_json::to_value(MapEvent::MouseLeave).unwrap()["type"], "mouseLeave");
    }

    #[test]
    fn test_queue_clones_share_events() {
        let queue = EventQueue::new();
        let mut sink = queue.clone();
        sink.on_event(&MapEvent::Load);
        sink.on_event(&MapEvent::Move);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain(), vec![MapEvent::Load, MapEvent::Move]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_closure_listener() {
        let mut count = 0;
        {
            let mut listener = |_: &MapEvent| count += 1;
            listener.on_event(&MapEvent::Move);
        }
        assert_eq!(count, 1);
    }
}
