//! Change batching, model event routing and consumer notifications

pub mod batch;
pub mod dispatcher;
pub mod events;
pub mod router;

pub use batch::{ChangeBatch, ChangeClass};
pub use dispatcher::{GridEventDispatcher, GridEventSubscriber, RecordingSubscriber};
pub use events::{EventPayload, GridEvent, ModelEvent, ModelNotification};
pub use router::EventSource;
