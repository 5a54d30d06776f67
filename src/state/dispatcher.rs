//! Grid event dispatcher for pub-sub delivery to consumers

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::state::events::GridEvent;

/// Trait for components that subscribe to grid events
pub trait GridEventSubscriber {
    /// Handle a grid event
    fn on_grid_event(&mut self, event: &GridEvent);

    /// Get subscriber name for debugging
    fn name(&self) -> &str;
}

/// A subscriber is shared so delivery can run without the dispatcher
/// borrowed, leaving subscribers free to call back into the grid
pub type SharedSubscriber = Rc<RefCell<Box<dyn GridEventSubscriber>>>;

struct SubscriberEntry {
    name: String,
    subscriber: SharedSubscriber,
}

/// Delivers grid events to subscribers and keeps a bounded history
pub struct GridEventDispatcher {
    /// List of subscribers
    subscribers: Vec<SubscriberEntry>,

    /// Event history for debugging
    event_history: VecDeque<GridEvent>,

    /// Maximum event history size
    max_history: usize,
}

impl GridEventDispatcher {
    pub fn new(max_history: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            event_history: VecDeque::with_capacity(max_history.min(1024)),
            max_history: max_history.max(1),
        }
    }

    /// Add a subscriber
    pub fn subscribe(&mut self, subscriber: Box<dyn GridEventSubscriber>) {
        info!(target: "grid", "Adding event subscriber: {}", subscriber.name());
        self.subscribers.push(SubscriberEntry {
            name: subscriber.name().to_string(),
            subscriber: Rc::new(RefCell::new(subscriber)),
        });
    }

    /// Remove every subscriber with the given name. Returns how many went.
    pub fn unsubscribe(&mut self, name: &str) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.name != name);
        before - self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Current subscribers, for delivery after this borrow is released
    pub fn subscribers(&self) -> Vec<SharedSubscriber> {
        self.subscribers
            .iter()
            .map(|entry| Rc::clone(&entry.subscriber))
            .collect()
    }

    /// Dispatch a grid event
    pub fn dispatch(&mut self, event: GridEvent) {
        deliver(&self.subscribers(), &event);
        self.record(event);
    }

    /// Record event in history
    pub fn record(&mut self, event: GridEvent) {
        if self.event_history.len() >= self.max_history {
            self.event_history.pop_front();
        }
        self.event_history.push_back(event);
    }

    /// Get event history for debugging, oldest first
    pub fn get_event_history(&self) -> Vec<GridEvent> {
        self.event_history.iter().cloned().collect()
    }

    pub fn clear_history(&mut self) {
        self.event_history.clear();
    }
}

/// Hand one event to each subscriber. A subscriber already handling an
/// event further up the stack is skipped.
pub fn deliver(subscribers: &[SharedSubscriber], event: &GridEvent) {
    debug!(target: "grid", "Dispatching {}", event);
    for subscriber in subscribers {
        match subscriber.try_borrow_mut() {
            Ok(mut subscriber) => subscriber.on_grid_event(event),
            Err(_) => warn!(target: "grid", "subscriber busy, {} not delivered to it", event),
        }
    }
}

/// Subscriber that records every event into a shared list
pub struct RecordingSubscriber {
    name: String,
    events: Rc<RefCell<Vec<GridEvent>>>,
}

impl RecordingSubscriber {
    /// Create a subscriber and the handle its events can be read from
    pub fn new(name: impl Into<String>) -> (Self, Rc<RefCell<Vec<GridEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                name: name.into(),
                events: Rc::clone(&events),
            },
            events,
        )
    }
}

impl GridEventSubscriber for RecordingSubscriber {
    fn on_grid_event(&mut self, event: &GridEvent) {
        self.events.borrow_mut().push(event.clone());
    }

    fn name(&self) -> &str {
        &self.name
    }
}
